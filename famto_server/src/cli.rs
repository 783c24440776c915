use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (FAMTO_PUSH_SERVER_KEY, FAMTO_RAZORPAY_KEY_SECRET) are never listed here
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "FAMTO_HOST",
        "FAMTO_PORT",
        "FAMTO_DATABASE_URL",
        "FAMTO_ADMIN_ID",
        "FAMTO_EVENT_BUFFER_SIZE",
        "FAMTO_OFFER_SWEEP_INTERVAL",
        "FAMTO_PUSH_ENDPOINT",
        "FAMTO_RAZORPAY_KEY_ID",
        "FAMTO_RAZORPAY_BASE_URL",
        "FAMTO_RAZORPAY_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
