use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::app::AppState;
use crate::tools::{
    GenerateTattooRequest, ListImagesRequest, ProfileRequest, SubmitImageRequest,
    UpdateProfileRequest,
};

#[derive(Clone)]
pub struct InkItServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

impl InkItServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state,
        }
    }
}

#[tool_router]
impl InkItServer {
    #[tool(description = "List the available tattoo styles and their prompt fragments")]
    async fn list_styles(&self) -> Result<CallToolResult, McpError> {
        crate::tools::list_styles().await
    }

    #[tool(
        description = "Register a photo for a user. Returns the image_id to pass to generate_tattoo"
    )]
    async fn submit_image(
        &self,
        Parameters(request): Parameters<SubmitImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::submit_image(&self.state, Parameters(request)).await
    }

    #[tool(
        description = "Turn a submitted photo into a tattoo design in the chosen style. Makes two AI calls and can take a while"
    )]
    async fn generate_tattoo(
        &self,
        Parameters(request): Parameters<GenerateTattooRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_tattoo(&self.state, Parameters(request)).await
    }

    #[tool(description = "List a user's photos and generated tattoos, newest first")]
    async fn list_images(
        &self,
        Parameters(request): Parameters<ListImagesRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::list_images(&self.state, Parameters(request)).await
    }

    #[tool(description = "Read a user's profile")]
    async fn get_profile(
        &self,
        Parameters(request): Parameters<ProfileRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::get_profile(&self.state, Parameters(request)).await
    }

    #[tool(description = "Change a user's username and/or avatar URL")]
    async fn update_profile(
        &self,
        Parameters(request): Parameters<UpdateProfileRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::update_profile(&self.state, Parameters(request)).await
    }

    #[tool(
        description = "Clear a user's profile and delete all of their photos and tattoos. Cannot be undone"
    )]
    async fn reset_profile(
        &self,
        Parameters(request): Parameters<ProfileRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::reset_profile(&self.state, Parameters(request)).await
    }
}

#[tool_handler]
impl ServerHandler for InkItServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Submit a photo with submit_image, then call generate_tattoo with the returned image_id."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
