use std::env;

use inquire::Select;
use iqr_ptu2::{
    ptu::PanTilt,
    serial::{DEFAULT_SLAVE_ID, PortSettings},
};

// Configuration constants - adjust these for your setup
const DEFAULT_PORT: &str = "/dev/pan_tilt";

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");
        if ports.is_empty() {
            return DEFAULT_PORT.to_string();
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let settings = PortSettings::new(port_name);
    let mut pan_tilt = PanTilt::open(&settings, DEFAULT_SLAVE_ID).expect("Failed to open serial port");

    println!("SN: {}", pan_tilt.get_serial_number().unwrap());
    println!("HW_VERSION: {}", pan_tilt.get_hardware_version().unwrap());
    println!("SW_VERSION: {}", pan_tilt.get_software_version().unwrap());
    println!("FW_VERSION: {}", pan_tilt.get_firmware_version().unwrap());
    println!();

    println!("ID: {}", pan_tilt.get_id().unwrap());
    println!();

    pan_tilt.move_to(60.0, 0.0, Some(10)).unwrap();
    pan_tilt.move_to(-60.0, 60.0, Some(20)).unwrap();
    pan_tilt.move_to(0.0, -60.0, Some(30)).unwrap();
    pan_tilt.move_to(0.0, 0.0, None).unwrap();
}
