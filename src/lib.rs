//! ActionScript/MXML Language Server implementation.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod analysis;
mod document;
pub mod error;
mod lsp;
pub mod project;
pub(crate) mod settings;
pub mod snapshot;

pub use document::{Dialect, DocumentStore, IncludeSplice, LineIndex, OffsetCue, SourceDocument};
pub use lsp::{definition, rename};
pub use settings::{discover_settings, load_settings, Settings};

use analysis::rename::{Refusal, RenameOutcome};
use analysis::{AnalysisOptions, Context};
use error::Cancelled;
use project::ProjectProvider;
use snapshot::{ProjectModel, SnapshotProvider};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    workspace_root: OnceLock<PathBuf>,
    provider: OnceLock<Arc<dyn ProjectProvider>>,
    options: OnceLock<Arc<AnalysisOptions>>,
    /// Reported to the client once it is initialized.
    status: OnceLock<(MessageType, String)>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            workspace_root: OnceLock::new(),
            provider: OnceLock::new(),
            options: OnceLock::new(),
            status: OnceLock::new(),
        }
    }

    /// Configure the project provider from the settings near the workspace root.
    fn configure(&self, root: Option<PathBuf>) {
        let (settings, settings_dir) = match &root {
            Some(root) => settings::discover_settings(root),
            None => (Settings::default(), PathBuf::from(".")),
        };
        if let Some(root) = root {
            let _ = self.workspace_root.set(root);
        }
        let _ = self.options.set(Arc::new(settings.analysis_options()));

        if self.provider.get().is_some() {
            return;
        }
        let (provider, status) = match settings.snapshot_path(&settings_dir) {
            Some(path) => match ProjectModel::load(&path) {
                Ok(model) => (
                    SnapshotProvider::new(model),
                    (
                        MessageType::INFO,
                        format!("loaded project snapshot {}", path.display()),
                    ),
                ),
                Err(err) => {
                    tracing::warn!(%err, "continuing without a project");
                    (SnapshotProvider::empty(), (MessageType::WARNING, err.to_string()))
                }
            },
            None => (
                SnapshotProvider::empty(),
                (
                    MessageType::INFO,
                    format!("no project snapshot configured in {}", settings::SETTINGS_FILE),
                ),
            ),
        };
        let _ = self.provider.set(Arc::new(provider));
        let _ = self.status.set(status);
    }

    /// Answer a request on the blocking pool.
    ///
    /// The token is cancelled when the returned future is dropped, which is
    /// how tower-lsp abandons a request on `$/cancelRequest`.
    async fn run<T, F>(&self, uri: &Url, job: F) -> Result<Option<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Context<'_>, &SourceDocument) -> std::result::Result<T, Cancelled>
            + Send
            + 'static,
    {
        let (Some(options), Some(provider)) = (self.options.get(), self.provider.get()) else {
            return Ok(None);
        };
        let options = options.clone();
        let Some(document) = self.documents.source(uri, &options.markup_extensions) else {
            return Ok(None);
        };
        let Some(project) = provider.project_for_source(&document.path) else {
            return Ok(None);
        };

        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();
        let task = tokio::task::spawn_blocking(move || {
            let ctx = Context::new(project.as_ref(), &options, &token);
            job(&ctx, &document)
        });
        match task.await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(Cancelled)) => Err(Error {
                code: ErrorCode::RequestCancelled,
                message: Cancelled.to_string().into(),
                data: None,
            }),
            Err(err) => {
                tracing::error!(%err, "request task failed");
                Err(Error::internal_error())
            }
        }
    }
}

/// Protocol form of a rename outcome: refusals and unresolved symbols are
/// `null`, nothing to rename is an empty edit.
fn workspace_edit(outcome: RenameOutcome) -> Option<WorkspaceEdit> {
    match outcome {
        RenameOutcome::Edit(plan) => Some(plan.into_workspace_edit()),
        RenameOutcome::NoTarget | RenameOutcome::Refused(Refusal::FallbackProject) => {
            Some(WorkspaceEdit::default())
        }
        RenameOutcome::Unresolved => None,
        RenameOutcome::Refused(refusal) => {
            tracing::info!(?refusal, "rename refused");
            None
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });
        self.configure(workspace_root);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!(root = ?self.workspace_root.get(), "initialized");
        self.client
            .log_message(MessageType::INFO, "ActionScript language server initialized")
            .await;
        if let Some((kind, message)) = self.status.get() {
            self.client.log_message(*kind, message.clone()).await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.documents
            .open(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // We use FULL sync, so there's exactly one change with the full text
        if let Some(change) = params.content_changes.into_iter().next() {
            self.documents.open(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let response = self
            .run(uri, move |ctx, document| {
                lsp::definition(ctx, document, position)
            })
            .await?;
        Ok(Some(
            response.unwrap_or_else(|| GotoDefinitionResponse::Array(Vec::new())),
        ))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let new_name = params.new_name;
        let outcome = self
            .run(uri, move |ctx, document| {
                lsp::rename(ctx, document, position, &new_name)
            })
            .await?;
        match outcome {
            Some(outcome) => Ok(workspace_edit(outcome)),
            None => Ok(Some(WorkspaceEdit::default())),
        }
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}

/// A service answering from `provider` instead of the configured snapshot.
pub fn create_service_with_provider(
    provider: Arc<dyn ProjectProvider>,
) -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(move |client| {
        let backend = Backend::new(client);
        let _ = backend.provider.set(provider);
        backend
    })
}
