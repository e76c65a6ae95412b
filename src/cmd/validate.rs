//! `edge-gateway validate`: check the backend configuration.
//!
//! Builds the target registry from the same flags and environment that
//! `run` uses and reports every problem at once, as text or JSON.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::default_rules;
use crate::config::validation;
use crate::error::GatewayError;
use crate::proxy::routing::RouteTable;

pub fn execute(args: &ValidateArgs) -> Result<(), GatewayError> {
    let registry = match validation::validate(&args.backends.to_urls()) {
        Ok(registry) => registry,
        Err(errors) => {
            match args.format {
                ValidateFormat::Text => {
                    eprintln!("\u{2717} backend configuration has {} errors\n", errors.len());
                    for error in &errors {
                        eprintln!("{error}");
                    }
                }
                ValidateFormat::Json => {
                    let json_errors: Vec<serde_json::Value> = errors
                        .iter()
                        .map(|e| {
                            serde_json::json!({
                                "service": e.service,
                                "field": e.field,
                                "message": e.message,
                                "suggestion": e.suggestion,
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({
                            "valid": false,
                            "errors": json_errors,
                        })
                    );
                }
            }
            return Err(GatewayError::ConfigValidation { errors });
        }
    };

    let table = RouteTable::new(default_rules());

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&registry, table.rules())
            );
        }
        ValidateFormat::Json => {
            let targets: serde_json::Map<String, serde_json::Value> = registry
                .iter()
                .map(|(service, url)| (service.name().to_string(), url.as_str().into()))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "targets": targets,
                    "rules": table.rules(),
                })
            );
        }
    }

    Ok(())
}
