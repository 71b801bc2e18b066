use anyhow::Result;
use mockmate::{
    cli::{actions, actions::Action, start, telemetry},
    mockmate::version_string,
};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let action = start()?;

    // Handle the action
    let result = match action {
        Action::Version => {
            println!("{}", version_string());
            Ok(())
        }
        Action::Run { globals, task } => actions::handle(task, &globals).await,
    };

    telemetry::shutdown_tracer();

    result
}
