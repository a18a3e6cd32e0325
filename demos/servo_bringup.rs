/*!
    full bring-up of one axis: walk the state machine to operation enabled, home it,
    then run one absolute move and report the final position.

    Pass the controller address as first argument, port 502 is the gateway default.
*/

use modcan::{Axis, HomingProfile, MotionProfile, Positioning};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let address = std::env::args().nth(1)
        .unwrap_or_else(|| "169.254.239.1:502".into())
        .parse()?;

    let mut axis = Axis::connect(address).await?;
    println!("device type {:#010x}", axis.device_type().await?);

    axis.bring_up().await?;
    println!("drive is {}", axis.status().await?);

    axis.home(&HomingProfile::default()).await?;
    println!("homed, position {}", axis.position().await?);

    // one feed constant of travel
    axis.move_to(5400, &MotionProfile::default(), Positioning::Absolute).await?;
    println!("done, position {}", axis.position().await?);
    Ok(())
}
