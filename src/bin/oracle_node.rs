use std::env;
use std::fs;

use serde::Deserialize;
use serde_json::json;

use oracle_node_lib::credentials::CredentialManager;
use oracle_node_lib::logging;
use oracle_node_lib::node::{StaticParameters, CREDENTIAL_NAME};
use oracle_node_lib::oracle::client;
use oracle_node_lib::oracle::{ConnectionConfig, Record};

/// Invocation file accepted by `run`
#[derive(Debug, Deserialize)]
struct Invocation {
  #[serde(flatten)]
  parameters: StaticParameters,
  #[serde(default)]
  #[cfg_attr(not(feature = "oracle"), allow(dead_code))]
  items: Vec<Record>,
}

fn print_json<T: serde::Serialize>(value: &T) {
  match serde_json::to_string_pretty(value) {
    Ok(s) => println!("{}", s),
    Err(e) => eprintln!("failed to serialize: {}", e),
  }
}

fn usage() {
  eprintln!(
    "Oracle Node CLI\n\n\
    Commands:\n\
      ready [--client-dir <dir>]            Check Instant Client detection\n\
      prime [--client-dir <dir>]            Load the Instant Client library\n\
      set-creds <name> --host <host> --port <port> --service <service> \\\n\
                --user <user> --password <pass> [--connect-string <cs>]\n\
                                           Store a connection in the OS keychain\n\
      get-creds <name>                      Show a stored connection (no password)\n\
      delete-creds <name>                   Remove a stored connection\n\
      test-conn <name> [--client-dir <dir>] Connect with stored credentials\n\
      run --file <invocation.json> [--creds <name>] [--client-dir <dir>]\n\
                                           Execute the node over the file's items\n\n\
    Options:\n\
      -v, -vv                               Debug / trace logging on stderr\n\
    "
  );
}

fn parse_flag(args: &[String], name: &str) -> Option<String> {
  let mut it = args.iter();
  while let Some(tok) = it.next() {
    if tok == name {
      return it.next().cloned();
    }
  }
  None
}

fn verbosity(args: &[String]) -> usize {
  args
    .iter()
    .map(|a| match a.as_str() {
      "-v" => 1,
      "-vv" => 2,
      _ => 0,
    })
    .sum()
}

fn cmd_ready(args: &[String]) -> i32 {
  let dir = parse_flag(args, "--client-dir");
  let path = client::resolve_client_path(dir.as_deref());
  let installed = client::check_client_ready(dir.as_deref());
  print_json(&json!({
    "installed": installed,
    "path": path.join(client::ORACLE_LIB_NAME).to_string_lossy(),
    "primed": client::is_client_primed(),
  }));
  if installed { 0 } else { 5 }
}

fn cmd_prime(args: &[String]) -> i32 {
  let dir = parse_flag(args, "--client-dir");
  match client::prime_client(dir.as_deref()) {
    Ok(()) => {
      println!("Primed Oracle client environment and loaded {}", client::ORACLE_LIB_NAME);
      0
    }
    Err(e) => {
      eprintln!("Prime failed: {}", e);
      6
    }
  }
}

fn cmd_set_creds(name: &str, args: &[String]) -> i32 {
  let host = parse_flag(args, "--host").unwrap_or_default();
  let service = parse_flag(args, "--service").unwrap_or_default();
  let port = match parse_flag(args, "--port") {
    None => 1521,
    Some(p) => match p.parse::<u16>() {
      Ok(p) => p,
      Err(_) => { eprintln!("Invalid --port"); return 4; }
    },
  };
  let user = match parse_flag(args, "--user") { Some(v) => v, None => { eprintln!("Missing --user"); return 4; } };
  let password = match parse_flag(args, "--password") { Some(v) => v, None => { eprintln!("Missing --password"); return 4; } };

  let mut config = ConnectionConfig::new(host, port, service, user, password);
  if let Some(cs) = parse_flag(args, "--connect-string") {
    config = config.with_connection_string(cs);
  }

  match CredentialManager::set_connection(name, &config) {
    Ok(()) => {
      println!("Stored credentials for '{}'", name);
      0
    }
    Err(e) => {
      eprintln!("Failed to store credentials: {}", e);
      2
    }
  }
}

fn cmd_get_creds(name: &str) -> i32 {
  match CredentialManager::get_connection(name) {
    Ok(config) => {
      print_json(&json!({
        "name": name,
        "host": config.host,
        "port": config.port,
        "serviceName": config.service_name,
        "user": config.user,
        "connectionString": config.connection_string,
        "hasPassword": !config.password.is_empty(),
      }));
      0
    }
    Err(e) => {
      eprintln!("Failed to get credentials: {}", e);
      3
    }
  }
}

fn cmd_delete_creds(name: &str) -> i32 {
  match CredentialManager::delete_connection(name) {
    Ok(()) => {
      println!("Deleted credentials for '{}'", name);
      0
    }
    Err(e) => {
      eprintln!("Failed to delete credentials: {}", e);
      3
    }
  }
}

#[cfg(feature = "oracle")]
fn cmd_test_conn(name: &str, args: &[String]) -> i32 {
  use oracle_node_lib::oracle::OracleSession;
  use oracle_node_lib::oracle::Session;

  let config = match CredentialManager::get_connection(name) {
    Ok(c) => c,
    Err(e) => {
      eprintln!("Failed to load credentials for '{}': {}", name, e);
      return 7;
    }
  };

  let dir = parse_flag(args, "--client-dir");
  let mut session = match OracleSession::open(&config, dir.as_deref()) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Connection failed: {}", e);
      return 8;
    }
  };

  let result = session.test_connection();
  if let Err(e) = session.close() {
    log::warn!("{}", e);
  }
  match result {
    Ok(()) => {
      println!("Connection succeeded for '{}' to {}", name, config.connect_string());
      0
    }
    Err(e) => {
      eprintln!("{}", e);
      8
    }
  }
}

#[cfg(not(feature = "oracle"))]
fn cmd_test_conn(_name: &str, _args: &[String]) -> i32 {
  eprintln!("Oracle support not compiled; rebuild with --features oracle");
  10
}

fn load_invocation(args: &[String]) -> Result<Invocation, (String, i32)> {
  let path = parse_flag(args, "--file").ok_or_else(|| ("Missing --file".to_string(), 4))?;
  let text = fs::read_to_string(&path)
    .map_err(|e| (format!("Failed to read '{}': {}", path, e), 4))?;
  let mut invocation: Invocation = serde_json::from_str(&text)
    .map_err(|e| (format!("Invalid invocation file '{}': {}", path, e), 4))?;

  if let Some(name) = parse_flag(args, "--creds") {
    let config = CredentialManager::get_connection(&name)
      .map_err(|e| (format!("Failed to load credentials for '{}': {}", name, e), 7))?;
    invocation.parameters = invocation.parameters.with_credential(CREDENTIAL_NAME, config);
  }
  Ok(invocation)
}

#[cfg(feature = "oracle")]
fn cmd_run(args: &[String]) -> i32 {
  use oracle_node_lib::node::execute;
  use oracle_node_lib::oracle::OracleConnector;

  let invocation = match load_invocation(args) {
    Ok(i) => i,
    Err((message, code)) => {
      eprintln!("{}", message);
      return code;
    }
  };

  let connector = match parse_flag(args, "--client-dir") {
    Some(dir) => OracleConnector::with_client_dir(dir),
    None => OracleConnector::new(),
  };

  match execute(&invocation.parameters, &connector, &invocation.items) {
    Ok(items) => {
      print_json(&items);
      0
    }
    Err(e) => {
      eprintln!("Execution failed: {}", e);
      if let Some(hint) = e.hint() {
        eprintln!("Hint: {}", hint);
      }
      9
    }
  }
}

#[cfg(not(feature = "oracle"))]
fn cmd_run(args: &[String]) -> i32 {
  if let Err((message, code)) = load_invocation(args) {
    eprintln!("{}", message);
    return code;
  }
  eprintln!("Oracle support not compiled; rebuild with --features oracle");
  10
}

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() < 2 {
    usage();
    std::process::exit(1);
  }

  if let Err(e) = logging::init(logging::level_from_verbosity(verbosity(&args))) {
    eprintln!("failed to initialize logging: {}", e);
  }

  let rest = &args[2..];
  let code = match args[1].as_str() {
    "ready" => cmd_ready(rest),
    "prime" => cmd_prime(rest),
    "set-creds" => {
      if rest.is_empty() { eprintln!("Usage: set-creds <name> --user <user> --password <pass> ..."); 2 } else { cmd_set_creds(&rest[0], &rest[1..]) }
    }
    "get-creds" => {
      if rest.is_empty() { eprintln!("Usage: get-creds <name>"); 3 } else { cmd_get_creds(&rest[0]) }
    }
    "delete-creds" => {
      if rest.is_empty() { eprintln!("Usage: delete-creds <name>"); 3 } else { cmd_delete_creds(&rest[0]) }
    }
    "test-conn" => {
      if rest.is_empty() { eprintln!("Usage: test-conn <name>"); 7 } else { cmd_test_conn(&rest[0], &rest[1..]) }
    }
    "run" => cmd_run(rest),
    _ => { usage(); 1 }
  };

  std::process::exit(code);
}
