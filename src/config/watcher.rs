//! Hot reload of the redirect rule table.
//!
//! Watches the configuration file and publishes the redirect rules of every
//! reload that parses and validates. Only the rule table is live-reloadable;
//! listener, upstream, or observability changes still need a restart.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RedirectRuleConfig;

/// Minimum gap between reload attempts. Editors fire several filesystem
/// events per save; one reload covers them all.
const RELOAD_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Watches the configuration file and emits reloaded redirect rule tables.
pub struct RuleWatcher {
    path: PathBuf,
}

impl RuleWatcher {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Start watching.
    ///
    /// Returns the watcher handle (watching stops when it is dropped) and
    /// the stream of reloaded rule tables. A reload that fails to parse or
    /// validate, or that leaves the rules unchanged, publishes nothing.
    pub fn spawn(
        self,
    ) -> Result<
        (
            RecommendedWatcher,
            mpsc::UnboundedReceiver<Vec<RedirectRuleConfig>>,
        ),
        notify::Error,
    > {
        let (tx, rx) = mpsc::unbounded_channel();
        let reload_path = self.path.clone();
        let mut last_attempt: Option<Instant> = None;
        let mut published: Option<Vec<RedirectRuleConfig>> = None;

        let mut watcher = RecommendedWatcher::new(
            move |event: notify::Result<Event>| {
                match event {
                    Ok(event) if event.kind.is_modify() || event.kind.is_create() => {}
                    Ok(_) => return,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                }

                let now = Instant::now();
                if last_attempt
                    .is_some_and(|at| now.duration_since(at) < RELOAD_QUIET_PERIOD)
                {
                    return;
                }
                last_attempt = Some(now);

                match load_config(&reload_path) {
                    Ok(config) => {
                        if published.as_ref() == Some(&config.redirects) {
                            tracing::debug!("Config file touched, redirect rules unchanged");
                            return;
                        }
                        tracing::info!(
                            rules = config.redirects.len(),
                            "Config file changed, publishing reloaded redirect rules"
                        );
                        published = Some(config.redirects.clone());
                        let _ = tx.send(config.redirects);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reload failed, keeping current rules");
                    }
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Watching config file for rule changes");
        Ok((watcher, rx))
    }
}
