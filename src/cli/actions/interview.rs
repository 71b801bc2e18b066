use crate::{
    cli::actions::{Services, Task},
    mockmate::{auth::SelectedFile, interview::InterviewSetup},
};
use anyhow::{anyhow, Result};
use tracing::{info, instrument};

/// Handle the interview setup action
#[instrument(skip_all)]
pub async fn handle(task: Task, services: &Services) -> Result<()> {
    let (role, interview_type, tech, duration, profile_image) = match task {
        Task::Interview {
            role,
            interview_type,
            tech,
            duration,
            profile_image,
        } => (role, interview_type, tech, duration, profile_image),
        other => return Err(anyhow!("not an interview action: {other:?}")),
    };

    let user = services.guard().await?.require_user().await?;

    let mut setup = InterviewSetup::new();
    setup.set_type(interview_type);
    setup.set_role(role);
    for tech in &tech {
        setup.toggle_tech(tech)?;
    }
    setup.set_duration(duration)?;
    if let Some(path) = profile_image {
        setup.stage_photo(SelectedFile::from_path(path)).await?;
    }

    let plan = setup.start(Some(&user))?;
    info!(plan = %plan.id, "interview plan ready");

    println!("Interview Generation\n");
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
