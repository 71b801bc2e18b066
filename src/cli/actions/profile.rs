use crate::{
    cli::actions::{Services, Task},
    mockmate::{
        auth::{
            exchange::asset_path, types::AccountId, AssetKind, Notification, Notifier,
            ObjectStorage, SelectedFile,
        },
        profile::{ProfileEditor, ProfileSave},
        records::User,
    },
};
use anyhow::{anyhow, Result};
use tracing::instrument;

fn print_profile(editor: &ProfileEditor) {
    let user = editor.user();
    println!("{}", user.name);
    println!("{}", user.email);
    if editor.avatar().starts_with("data:") {
        println!("Avatar: (new picture)");
    } else {
        println!("Avatar: {}", editor.avatar());
    }
}

async fn upload_image(services: &Services, user: &User, save: &mut ProfileSave) -> Result<()> {
    if let Some(image) = save.image.take() {
        let path = asset_path(
            &AccountId::new(user.id.as_str()),
            AssetKind::Profile,
            image.file_name(),
        );
        let url = services.storage.upload(&path, &image).await?;
        save.update.image_url = Some(url);
    }
    Ok(())
}

/// Handle the profile action
#[instrument(skip_all)]
pub async fn handle(task: Task, services: &Services) -> Result<()> {
    let (name, email, image) = match task {
        Task::Profile { name, email, image } => (name, email, image),
        other => return Err(anyhow!("not a profile action: {other:?}")),
    };

    let records = services.records().await?;
    let user = services.guard().await?.require_user().await?;
    let mut editor = ProfileEditor::new(user.clone());

    if name.is_none() && email.is_none() && image.is_none() {
        print_profile(&editor);
        return Ok(());
    }

    editor.begin_edit();
    if let Some(name) = name {
        editor.set_name(name)?;
    }
    if let Some(email) = email {
        editor.set_email(email)?;
    }
    if let Some(path) = image {
        editor.stage_image(SelectedFile::from_path(path)).await?;
    }

    let mut save = editor.save()?;
    upload_image(services, &user, &mut save).await?;
    let updated = records.update_profile(&user.id, &save.update).await?;
    editor.apply_saved(updated);

    services
        .notifier
        .notify(Notification::success("Profile saved"));
    print_profile(&editor);

    Ok(())
}
