use crate::constants::PROGRAM_VERSION;
use anyhow::Result;

/// Prints the program version. No other effect.
pub fn handle() -> Result<()> {
    println!("v{}", PROGRAM_VERSION);
    Ok(())
}
