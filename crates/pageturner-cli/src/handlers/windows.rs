//! `pageturner windows`: list windows that can be read.

use anyhow::Result;

use crate::bootstrap;
use crate::commands::WindowsArgs;
use crate::presentation::format_windows;

/// Execute the windows command.
pub async fn execute(args: &WindowsArgs) -> Result<()> {
    let windows = bootstrap::windows(args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    if windows.is_empty() {
        println!("No matching windows found.");
        return Ok(());
    }
    print!("{}", format_windows(&windows));
    Ok(())
}
