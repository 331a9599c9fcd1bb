//! Module `worker`
//!
//! The background execution unit. It owns nothing but a storage root and
//! talks to callers only through request and response channels, running one
//! operation at a time in arrival order.

use log::{debug, error, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::broker::protocol::{Operation, Request, Response};
use crate::error::VfsError;
use crate::storage::StorageRoot;
use crate::storage::operations;

/// Sequential executor of storage mutations
pub struct FileWorker {
    root: StorageRoot,
    batch_step: usize,
}

impl FileWorker {
    pub fn new(root: StorageRoot, batch_step: usize) -> Self {
        Self { root, batch_step }
    }

    /// Performs a single operation against storage
    pub async fn execute(&self, operation: &Operation) -> Result<(), VfsError> {
        match operation {
            Operation::Upload(p) => operations::upload_file(&self.root, &p.file, &p.filepath).await,
            Operation::SaveText(p) => {
                operations::save_text_file(&self.root, &p.text, &p.filepath).await
            }
            Operation::MoveFile(p) => {
                operations::move_file(&self.root, &p.source_path, &p.destination_path).await
            }
            Operation::MoveFolder(p) => {
                operations::move_folder(
                    &self.root,
                    &p.source_path,
                    &p.destination_path,
                    self.batch_step,
                )
                .await
            }
            Operation::DeleteFile(p) => operations::delete_file(&self.root, &p.path).await,
            Operation::DeleteFolder(p) => {
                operations::delete_folder(&self.root, &p.path, self.batch_step).await
            }
        }
    }

    /// Runs a request and builds its response
    pub async fn handle(&self, request: Request) -> Response {
        let kind = request.operation.kind();
        match self.execute(&request.operation).await {
            Ok(()) => {
                debug!("Request {} ({}) completed", request.id, kind);
                Response::success(request.id)
            }
            Err(e) => {
                error!("Request {} ({}) failed: {}", request.id, kind, e);
                Response::failure(request.id, e.to_string())
            }
        }
    }

    /// Processes requests until the request channel closes
    pub async fn run(
        self,
        mut requests: UnboundedReceiver<Request>,
        responses: UnboundedSender<Response>,
    ) {
        info!("File worker started");

        while let Some(request) = requests.recv().await {
            let response = self.handle(request).await;
            if responses.send(response).is_err() {
                warn!("Response channel closed, stopping file worker");
                break;
            }
        }

        info!("File worker stopped");
    }
}
