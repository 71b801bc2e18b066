use crate::{
    cli::{
        actions::{Services, Task},
        ui::password_or_prompt,
    },
    mockmate::auth::{
        AssetKind, CredentialForm, FormMode, Navigator, ProviderKind, Route, SelectedFile,
        SubmitOutcome,
    },
};
use anyhow::{anyhow, bail, Result};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use tracing::{instrument, warn};

/// Sign-in and sign-up are public-only: a live session sends the user home.
async fn already_signed_in(services: &Services) -> Result<bool> {
    let guard = services.guard().await?;
    match guard.redirect_if_signed_in().await {
        Ok(redirected) => {
            if redirected {
                println!("You are already signed in.");
            }
            Ok(redirected)
        }
        Err(err) => {
            warn!("unable to check the stored session: {err}");
            Ok(false)
        }
    }
}

async fn stage(form: &mut CredentialForm, path: Option<PathBuf>, kind: AssetKind) -> Result<()> {
    if let Some(path) = path {
        let asset = form.stage(SelectedFile::from_path(path), kind).await?;
        println!("Staged {kind}: {} ({})", asset.file_name(), asset.declared_mime());
    }
    Ok(())
}

async fn finish(services: &Services, outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Succeeded(completion) => {
            if let Some(session) = completion.session {
                services.sessions.save(&session).await?;
            }
            Ok(())
        }
        SubmitOutcome::Invalid(report) => {
            for error in report.errors() {
                eprintln!("  {error}");
            }
            bail!("the form has errors")
        }
        SubmitOutcome::Failed(err) => Err(anyhow!(err.user_message())),
        SubmitOutcome::InFlight => bail!("a submission is already in progress"),
    }
}

/// Handle the account actions
#[instrument(skip_all)]
pub async fn handle(task: Task, services: &Services) -> Result<()> {
    match task {
        Task::SignUp {
            name,
            email,
            password,
            profile_image,
            resume,
        } => {
            if already_signed_in(services).await? {
                return Ok(());
            }

            let mut form = CredentialForm::new(FormMode::SignUp);
            form.set_name(name);
            form.set_email(email);
            form.set_password(password_or_prompt(password).await?.expose_secret());
            stage(&mut form, profile_image, AssetKind::Profile).await?;
            stage(&mut form, resume, AssetKind::Resume).await?;

            finish(services, services.workflow().submit(form).await).await
        }
        Task::SignIn { email, password } => {
            if already_signed_in(services).await? {
                return Ok(());
            }

            let mut form = CredentialForm::new(FormMode::SignIn);
            form.set_email(email);
            form.set_password(password_or_prompt(password).await?.expose_secret());

            finish(services, services.workflow().submit(form).await).await
        }
        Task::Google { sign_up } => {
            if already_signed_in(services).await? {
                return Ok(());
            }

            let mode = if sign_up {
                FormMode::SignUp
            } else {
                FormMode::SignIn
            };
            let outcome = services
                .workflow()
                .submit_with_provider(ProviderKind::Google, mode)
                .await;

            finish(services, outcome).await
        }
        Task::SignOut => {
            if services.sessions.clear().await? {
                println!("Signed out.");
            } else {
                println!("You were not signed in.");
            }
            services.navigator.navigate(Route::SignIn);
            Ok(())
        }
        other => Err(anyhow!("not an account action: {other:?}")),
    }
}
