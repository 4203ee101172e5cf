use crate::config::KernelConfig;
use crate::middleware::{HttpKernel, RouteMiddlewareSource, RouteMiddlewareTable};
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;
use strata_core::{ConfigRepository, CoreError, ProviderContext, ProviderError, ServiceProvider};

/// Container id of a server's kernel
pub fn kernel_id(server: &str) -> String {
    format!("http.kernel.{}", server)
}

/// Builds one [`HttpKernel`] per server listed under `http.kernels`
pub struct HttpServiceProvider {
    route_middleware: Arc<dyn RouteMiddlewareSource>,
    route_exclusions: Arc<dyn RouteMiddlewareSource>,
    servers: Vec<String>,
}

impl HttpServiceProvider {
    pub const NAME: &'static str = "HttpServiceProvider";

    pub fn new() -> Self {
        Self {
            route_middleware: Arc::new(RouteMiddlewareTable::new()),
            route_exclusions: Arc::new(RouteMiddlewareTable::new()),
            servers: Vec::new(),
        }
    }

    /// Route middleware shared by every kernel
    pub fn with_route_middleware(mut self, source: Arc<dyn RouteMiddlewareSource>) -> Self {
        self.route_middleware = source;
        self
    }

    /// Route exclusions shared by every kernel
    pub fn with_route_exclusions(mut self, source: Arc<dyn RouteMiddlewareSource>) -> Self {
        self.route_exclusions = source;
        self
    }

    /// Servers whose kernels were bound
    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

impl Default for HttpServiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceProvider for HttpServiceProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> Option<&'static str> {
        Some("Binds the HTTP kernel of each configured server")
    }

    fn register(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let app = ctx.app();
        let kernels: IndexMap<String, KernelConfig> = app
            .repository()
            .get_as("http.kernels")
            .map_err(CoreError::from)?
            .unwrap_or_default();

        for (server, mut config) in kernels {
            // The map key names the server
            config.server = server.clone();

            let kernel = HttpKernel::from_config(config)
                .with_route_middleware(self.route_middleware.clone())
                .with_route_exclusions(self.route_exclusions.clone());

            app.container().instance(kernel_id(&server), kernel);
            tracing::debug!(server = %server, "bound http kernel");
            self.servers.push(server);
        }

        Ok(())
    }

    fn boot(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let app = ctx.app();

        for server in &self.servers {
            let kernel = app.container().make::<HttpKernel>(&kernel_id(server))?;
            app.repository()
                .set(
                    &format!("middlewares.{}", server),
                    json!(kernel.get_global_middleware()),
                )
                .map_err(CoreError::from)?;
        }

        tracing::info!(servers = self.servers.len(), "http kernels ready");
        Ok(())
    }
}
