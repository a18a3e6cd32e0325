/*!
    read-only diagnostic of one axis controller: device type, statusword flags, drive
    state, operation mode and position, without writing anything to the drive.
*/

use modcan::{registers, Axis, DriveState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let address = std::env::args().nth(1)
        .unwrap_or_else(|| "169.254.239.1:502".into())
        .parse()?;

    let mut axis = Axis::connect(address).await?;
    println!("device type {:#010x}", axis.device_type().await?);

    let state = axis.status().await?;
    let status = axis.last_status();
    println!("state: {state}");
    println!("status flags: {status:?}");
    if ! status.remote() {
        println!("warning: remote bit clear, check the hardware enable input");
    }
    if state == DriveState::Fault {
        println!("drive is faulted, a fault reset is required before motion");
    }

    let mode = axis.client().read(registers::cia402::mode_of_operation_display).await?;
    println!("operation mode: {mode}");
    println!("position: {}", axis.position().await?);
    Ok(())
}
