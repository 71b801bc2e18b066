use crate::{
    cli::{
        actions::{Action, Task},
        globals::GlobalArgs,
    },
    mockmate::{client::normalize_base_url, interview::InterviewType},
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn secret(matches: &ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.clone()))
}

fn url(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .and_then(|s| normalize_base_url(s))
}

/// Repeated `--tech` values collapse to their first occurrence, so a value
/// given twice is selected once instead of toggled back off.
fn tech(matches: &ArgMatches) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for value in matches.get_many::<String>("tech").into_iter().flatten() {
        if !selected.iter().any(|seen| seen.eq_ignore_ascii_case(value)) {
            selected.push(value.clone());
        }
    }
    selected
}

fn path(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<PathBuf>(id).cloned()
}

/// Connection settings from the global arguments.
///
/// # Errors
/// Fails when `--api-url` is missing.
pub fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let api_url = url(matches, "api-url")
        .ok_or_else(|| anyhow!("missing required argument: --api-url"))?;
    let mut globals = GlobalArgs::new(&api_url)?;

    if let Some(key) = secret(matches, "api-key") {
        globals.set_api_key(key);
    }
    if let Some(identity_url) = url(matches, "identity-url") {
        globals.identity_url = identity_url;
    }
    if let Some(storage_url) = url(matches, "storage-url") {
        globals.storage_url = storage_url;
    }
    if let Some(bucket) = string(matches, "storage-bucket") {
        globals.storage_bucket = bucket;
    }
    globals.oauth_client_id = string(matches, "oauth-client-id");
    globals.oauth_client_secret = secret(matches, "oauth-client-secret");
    if let Some(device_url) = url(matches, "device-url") {
        globals.device_url = device_url;
    }
    if let Some(token_url) = url(matches, "token-url") {
        globals.token_url = token_url;
    }
    if let Some(session_file) = path(matches, "session-file") {
        globals.session_file = session_file;
    }

    Ok(globals)
}

fn task(name: &str, sub_m: &ArgMatches) -> Result<Task> {
    let required = |id: &str| {
        string(sub_m, id).ok_or_else(|| anyhow!("missing required argument: --{id}"))
    };

    let task = match name {
        "sign-up" => Task::SignUp {
            name: required("name")?,
            email: required("email")?,
            password: secret(sub_m, "password"),
            profile_image: path(sub_m, "profile-image"),
            resume: path(sub_m, "resume"),
        },
        "sign-in" => Task::SignIn {
            email: required("email")?,
            password: secret(sub_m, "password"),
        },
        "google" => Task::Google {
            sign_up: sub_m.get_flag("sign-up"),
        },
        "sign-out" => Task::SignOut,
        "dashboard" => Task::Dashboard,
        "interview" => Task::Interview {
            role: string(sub_m, "role").unwrap_or_default(),
            interview_type: required("type")?.parse::<InterviewType>()?,
            tech: tech(sub_m),
            duration: required("duration")?
                .parse::<u32>()
                .context("invalid --duration")?,
            profile_image: path(sub_m, "profile-image"),
        },
        "profile" => Task::Profile {
            name: string(sub_m, "name"),
            email: string(sub_m, "email"),
            image: path(sub_m, "image"),
        },
        other => return Err(anyhow!("unknown command: {other}")),
    };

    Ok(task)
}

/// Turns parsed arguments into the action to run.
///
/// # Errors
/// Fails for unknown commands and missing connection settings.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub_m) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("missing command, see --help"))?;

    if name == "version" {
        return Ok(Action::Version);
    }

    Ok(Action::Run {
        task: task(name, sub_m)?,
        globals: globals(matches)?,
    })
}
