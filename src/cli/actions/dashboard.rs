use crate::{
    cli::actions::Services,
    mockmate::dashboard::{Dashboard, InterviewCard},
};
use anyhow::Result;
use tracing::instrument;

fn print_card(card: &InterviewCard) {
    let badges = card.badges().join(", ");
    println!(
        "  • {} ({}) [{}] {}",
        card.role,
        card.interview_type,
        badges,
        card.created_at.format("%b %d, %Y")
    );
}

fn print_dashboard(dashboard: &Dashboard) {
    println!(
        "Dashboard for {} <{}>\n",
        dashboard.user.name, dashboard.user.email
    );
    println!("Get Interview-Ready with AI-Powered Practice & Feedback");
    println!("Start an interview with: mockmate interview --role <role>\n");

    println!("Your Interviews");
    if dashboard.has_past {
        dashboard.your_interviews.iter().for_each(print_card);
    } else {
        println!("  You haven't taken any interviews yet");
    }

    println!("\nTake Interviews");
    dashboard.take_interviews.iter().for_each(print_card);
}

/// Handle the dashboard action
#[instrument(skip_all)]
pub async fn handle(services: &Services) -> Result<()> {
    let records = services.records().await?;
    let user = services.guard().await?.require_user().await?;

    let dashboard = Dashboard::load(records.as_ref(), user).await?;
    print_dashboard(&dashboard);

    Ok(())
}
