use crate::mockmate::{
    client::{
        device::{DEFAULT_DEVICE_URL, DEFAULT_TOKEN_URL},
        identity::DEFAULT_IDENTITY_URL,
        storage::DEFAULT_STORAGE_URL,
    },
    interview::TECH_OPTIONS,
    version_string,
};
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser, ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};
use std::{path::PathBuf, sync::LazyLock};

static LONG_VERSION: LazyLock<String> = LazyLock::new(version_string);

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn global_arg(name: &'static str, env: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).env(env).global(true)
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email address")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .short('p')
        .long("password")
        .help("Account password, prompted for when omitted")
}

fn subcommands() -> [Command; 8] {
    [
        Command::new("sign-up")
            .about("Create an account")
            .arg(
                Arg::new("name")
                    .short('n')
                    .long("name")
                    .help("Full name")
                    .required(true),
            )
            .arg(email_arg())
            .arg(password_arg())
            .arg(path_arg("profile-image", "Profile picture to upload"))
            .arg(path_arg("resume", "Resume (PDF) to upload")),
        Command::new("sign-in")
            .about("Sign in with email and password")
            .arg(email_arg())
            .arg(password_arg()),
        Command::new("google")
            .about("Continue with Google")
            .arg(
                Arg::new("sign-up")
                    .long("sign-up")
                    .help("Register a new account instead of signing in")
                    .action(ArgAction::SetTrue),
            ),
        Command::new("sign-out").about("Forget the stored session"),
        Command::new("dashboard").about("Show your interviews and interviews to take"),
        Command::new("interview")
            .about("Configure a practice interview")
            .arg(
                Arg::new("role")
                    .short('r')
                    .long("role")
                    .help("Role you are practicing for, example: Frontend Developer"),
            )
            .arg(
                Arg::new("type")
                    .short('t')
                    .long("type")
                    .help("Interview type")
                    .default_value("Technical")
                    .ignore_case(true)
                    .value_parser(PossibleValuesParser::new([
                        "Technical",
                        "HR",
                        "Managerial",
                        "Behavioral",
                    ])),
            )
            .arg(
                Arg::new("tech")
                    .long("tech")
                    .help("Technology to include, may be repeated")
                    .action(ArgAction::Append)
                    .ignore_case(true)
                    .value_parser(PossibleValuesParser::new(TECH_OPTIONS)),
            )
            .arg(
                Arg::new("duration")
                    .short('d')
                    .long("duration")
                    .help("Duration in minutes")
                    .default_value("15")
                    .value_parser(PossibleValuesParser::new([
                        "10", "15", "20", "30", "45", "60",
                    ])),
            )
            .arg(path_arg("profile-image", "Photo shown during the interview")),
        Command::new("profile")
            .about("Show or edit your profile")
            .arg(Arg::new("name").long("name").help("New name"))
            .arg(Arg::new("email").long("email").help("New email address"))
            .arg(path_arg("image", "New profile picture")),
        Command::new("version").about("Print version information"),
    ]
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("mockmate")
        .about("Practice job interviews")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(LONG_VERSION.as_str())
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(global_arg(
            "api-url",
            "MOCKMATE_API_URL",
            "Backend URL, example: https://mockmate.dev",
        ))
        .arg(
            global_arg(
                "identity-url",
                "MOCKMATE_IDENTITY_URL",
                "Identity Toolkit URL",
            )
            .default_value(DEFAULT_IDENTITY_URL),
        )
        .arg(
            global_arg("api-key", "MOCKMATE_API_KEY", "Identity Toolkit API key")
                .hide_env_values(true),
        )
        .arg(
            global_arg("storage-url", "MOCKMATE_STORAGE_URL", "Object storage URL")
                .default_value(DEFAULT_STORAGE_URL),
        )
        .arg(global_arg(
            "storage-bucket",
            "MOCKMATE_STORAGE_BUCKET",
            "Object storage bucket, example: mockmate.appspot.com",
        ))
        .arg(global_arg(
            "oauth-client-id",
            "MOCKMATE_OAUTH_CLIENT_ID",
            "OAuth client id used for Google sign-in",
        ))
        .arg(
            global_arg(
                "oauth-client-secret",
                "MOCKMATE_OAUTH_CLIENT_SECRET",
                "OAuth client secret used for Google sign-in",
            )
            .hide_env_values(true),
        )
        .arg(
            global_arg("device-url", "MOCKMATE_DEVICE_URL", "OAuth device authorization URL")
                .default_value(DEFAULT_DEVICE_URL),
        )
        .arg(
            global_arg("token-url", "MOCKMATE_TOKEN_URL", "OAuth token URL")
                .default_value(DEFAULT_TOKEN_URL),
        )
        .arg(
            global_arg(
                "session-file",
                "MOCKMATE_SESSION_FILE",
                "Where the signed-in session is kept (default: <config dir>/mockmate/session.json)",
            )
            .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("MOCKMATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommands(subcommands())
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_URL: &str = "https://api.mockmate.test";

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "mockmate");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Practice job interviews"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
        command.debug_assert();
    }

    #[test]
    fn test_sign_up_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "mockmate",
            "--api-url",
            API_URL,
            "sign-up",
            "--name",
            "Ann",
            "--email",
            "ann@x.com",
            "--password",
            "abcdef",
            "--resume",
            "/tmp/cv.pdf",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(|s| s.to_string()),
            Some(API_URL.to_string())
        );
        let (name, sub_m) = matches.subcommand().unwrap();
        assert_eq!(name, "sign-up");
        assert_eq!(
            sub_m.get_one::<String>("name").map(|s| s.to_string()),
            Some("Ann".to_string())
        );
        assert_eq!(
            sub_m.get_one::<PathBuf>("resume"),
            Some(&PathBuf::from("/tmp/cv.pdf"))
        );
        assert_eq!(sub_m.get_one::<PathBuf>("profile-image"), None);
    }

    #[test]
    fn test_interview_defaults() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "mockmate",
            "interview",
            "--role",
            "Backend Developer",
            "--tech",
            "Python",
            "--tech",
            "SQL",
        ]);

        let sub_m = matches.subcommand_matches("interview").unwrap();
        assert_eq!(
            sub_m.get_one::<String>("type").map(|s| s.to_string()),
            Some("Technical".to_string())
        );
        assert_eq!(
            sub_m.get_one::<String>("duration").map(|s| s.to_string()),
            Some("15".to_string())
        );
        let tech: Vec<&String> = sub_m.get_many::<String>("tech").unwrap().collect();
        assert_eq!(tech, ["Python", "SQL"]);
    }

    #[test]
    fn test_interview_rejects_unknown_duration() {
        let result = new().try_get_matches_from(vec!["mockmate", "interview", "--duration", "25"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("MOCKMATE_API_URL", Some(API_URL)),
                ("MOCKMATE_API_KEY", Some("key-123")),
                ("MOCKMATE_STORAGE_BUCKET", Some("mockmate.appspot.com")),
                ("MOCKMATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["mockmate", "dashboard"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(|s| s.to_string()),
                    Some(API_URL.to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("api-key").map(|s| s.to_string()),
                    Some("key-123".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("identity-url")
                        .map(|s| s.to_string()),
                    Some(DEFAULT_IDENTITY_URL.to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("MOCKMATE_LOG_LEVEL", Some(level)),
                    ("MOCKMATE_API_URL", Some(API_URL)),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["mockmate", "sign-out"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("MOCKMATE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "mockmate".to_string(),
                    "--api-url".to_string(),
                    API_URL.to_string(),
                    "dashboard".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
