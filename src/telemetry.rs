use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

/// Initialise tracing avec un filtre optionnel et un mode JSON conditionnel.
///
/// # Errors
///
/// Retourne une erreur si aucun filtre valide n'est trouvé, si la couche JSON
/// est demandée sans la fonctionnalité `json-logs`, ou si l'installation du
/// subscriber global échoue.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let filter = filter_candidates(explicit_filter, std::env::var("RUST_LOG").ok())
        .into_iter()
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))?;

    #[cfg(feature = "json-logs")]
    if use_json {
        let subscriber = Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .json()
                .flatten_event(true),
        );
        return tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| Error::Telemetry(err.to_string()));
    }

    #[cfg(not(feature = "json-logs"))]
    if use_json {
        return Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        ));
    }

    let subscriber = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::Telemetry(err.to_string()))
}

fn filter_candidates(explicit: Option<&str>, env: Option<String>) -> Vec<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(env)
        .chain(std::iter::once("info".to_string()))
        .collect()
}

/// Diagnostic du widget: `info` quand `verbose_mode` est actif, `debug` sinon.
macro_rules! verbose {
    ($settings:expr, $($arg:tt)+) => {
        if $settings.is_verbose() {
            ::tracing::info!(target: "notice", $($arg)+);
        } else {
            ::tracing::debug!(target: "notice", $($arg)+);
        }
    };
}

pub(crate) use verbose;
