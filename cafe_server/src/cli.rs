use std::env;

const HELP: &str = include_str!("./cli-help.txt");

/// Variables echoed by `--help`. Keys and secrets are left out.
const PUBLIC_ENVS: [&str; 10] = [
    "RUST_LOG",
    "CAFE_HOST",
    "CAFE_PORT",
    "CAFE_DATABASE_URL",
    "CAFE_JWT_EXPIRY_HOURS",
    "CAFE_ADMIN_EMAIL",
    "CAFE_RESERVATION_TIMEOUT",
    "CAFE_MIDTRANS_CLIENT_KEY",
    "CAFE_MIDTRANS_PRODUCTION",
    "CAFE_MIDTRANS_VERIFY_SIGNATURE",
];

/// The server takes no arguments. Passing any prints the help text and the current configuration instead, and
/// returns true so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("Current environment (secrets are not shown):");
    for (name, value) in environment_summary() {
        println!("  {name:<35} {value}");
    }
    true
}

fn environment_summary() -> Vec<(&'static str, String)> {
    PUBLIC_ENVS
        .iter()
        .map(|&name| {
            let value = match env::var_os(name) {
                None => "Not set".to_string(),
                Some(v) => v.into_string().unwrap_or_else(|v| format!("Invalid value: {}", v.to_string_lossy())),
            };
            (name, value)
        })
        .collect()
}
