pub mod api;
pub mod auth;
pub mod builder;
pub mod context;
pub mod fields;
pub mod library;
pub mod records;
pub mod schema;
pub mod settings;
pub mod workspaces;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use api::ApiGateway;
use auth::AuthService;
use builder::ModelBuilder;
use context::ClientContext;
use library::ModelLibrary;
use records::RecordListController;
use settings::{ClientSettings, SettingsStore};
use workspaces::WorkspaceDirectory;

const SETTINGS_ENV: &str = "ATLAS_SETTINGS";
const EMAIL_ENV: &str = "ATLAS_EMAIL";
const PASSWORD_ENV: &str = "ATLAS_PASSWORD";

/// Reads `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Settings, shared caches and the gateway, wired together once.
pub struct AtlasApp {
    pub settings: ClientSettings,
    pub context: ClientContext,
    pub gateway: Arc<ApiGateway>,
}

impl AtlasApp {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let context = ClientContext::from_settings(&settings)?;
        let gateway = ApiGateway::new(&settings, Arc::clone(&context.session))
            .context("Failed to build API client")?;
        Ok(Self {
            settings,
            context,
            gateway: Arc::new(gateway),
        })
    }

    /// Loads settings from `path` when given, then applies env overrides.
    pub fn from_path(path: Option<PathBuf>) -> Result<Self> {
        let settings = match path {
            Some(path) => SettingsStore::new(path)?.settings(),
            None => ClientSettings::default(),
        };
        Self::new(settings.with_env_overrides())
    }

    pub fn auth(&self) -> AuthService<ApiGateway> {
        AuthService::new(Arc::clone(&self.gateway), Arc::clone(&self.context.session))
    }

    pub fn workspaces(&self) -> WorkspaceDirectory<ApiGateway> {
        WorkspaceDirectory::new(Arc::clone(&self.gateway), self.context.clone())
    }

    pub fn model_builder(&self) -> ModelBuilder<ApiGateway> {
        ModelBuilder::new(Arc::clone(&self.gateway), self.context.clone())
    }

    pub fn model_library(&self) -> ModelLibrary<ApiGateway> {
        ModelLibrary::new(Arc::clone(&self.gateway), self.context.clone())
    }

    pub fn record_list(&self) -> RecordListController<ApiGateway> {
        RecordListController::new(
            Arc::clone(&self.gateway),
            self.context.clone(),
            &self.settings,
        )
    }
}

/// Demo flow: sign in, pick a workspace, print the first page of a model.
pub async fn run() -> Result<()> {
    init_logging();
    info!("AtlasBuilder client starting up...");

    let settings_path = std::env::var_os(SETTINGS_ENV).map(PathBuf::from);
    let app = AtlasApp::from_path(settings_path)?;
    info!("Using API at {}", app.gateway.base_url());

    let auth = app.auth();
    if !auth.is_authenticated() {
        let email = std::env::var(EMAIL_ENV)
            .with_context(|| format!("{EMAIL_ENV} is not set and no session is stored"))?;
        let password = std::env::var(PASSWORD_ENV)
            .with_context(|| format!("{PASSWORD_ENV} is not set"))?;
        auth.login(&email, &password).await?;
    }

    let directory = app.workspaces();
    match directory.refresh().await {
        Ok(memberships) => {
            for membership in &memberships {
                println!(
                    "workspace {:>4}  {} ({})",
                    membership.workspace.id, membership.workspace.name, membership.role
                );
            }
            if directory.selected().is_none() {
                if let Some(first) = memberships.first() {
                    directory.select(first.workspace.id);
                }
            }
        }
        Err(err) => warn!("{}", err),
    }

    let Some(slug) = std::env::args().nth(1) else {
        let library = app.model_library();
        library.refresh().await?;
        for model in library.visible_models().await {
            println!("model {:>4}  {} ({})", model.id, model.name, model.slug);
        }
        return Ok(());
    };

    let records = app.record_list();
    records.open(&slug).await?;
    let snapshot = records.snapshot().await;
    let model = snapshot
        .model
        .as_ref()
        .ok_or_else(|| anyhow!("model '{}' did not load", slug))?;

    let header: Vec<&str> = model.fields.iter().map(|field| field.name.as_str()).collect();
    println!("id\t{}", header.join("\t"));
    for row in &snapshot.rows {
        println!("{}\t{}", row.id, records.display_row(row).await.join("\t"));
    }
    println!(
        "page {} · {} rows{} · usage {}/{}",
        snapshot.params.page + 1,
        snapshot.rows.len(),
        if snapshot.has_more { " · more available" } else { "" },
        snapshot.usage.used,
        snapshot.usage.limit
    );
    Ok(())
}
