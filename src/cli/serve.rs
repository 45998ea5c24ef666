use std::sync::Arc;

use crate::{config::Settings, error, info, server};

use super::context::build_pipeline;

pub async fn serve() {
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let pipeline = match build_pipeline(&settings).await {
        Ok(p) => p,
        Err(e) => error!("Cannot set up the playlist pipeline. Err: {}", e),
    };

    info!("Serving on http://{}", settings.server_addr);
    if let Err(e) = server::start_api_server(&settings.server_addr, Arc::new(pipeline)).await {
        error!("Server stopped. Err: {}", e);
    }
}
