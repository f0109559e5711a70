//! MCP tool surface: the same search/read operations as the HTTP API,
//! exposed to agent hosts over stdio.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;

use crate::error::PaperError;
use crate::paper::{PaperContext, PaperReference, Resolution};
use crate::state::AppState;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// arXiv ID, e.g. "2205.14135"
    #[schemars(description = "arXiv ID, e.g. \"2205.14135\"")]
    pub id: Option<String>,

    /// arXiv URL, e.g. "https://arxiv.org/abs/2205.14135"
    #[schemars(description = "arXiv URL, e.g. \"https://arxiv.org/abs/2205.14135\"")]
    pub url: Option<String>,

    /// Paper title
    #[schemars(description = "Paper title")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadRequest {
    #[schemars(description = "arXiv ID, e.g. \"2205.14135\"")]
    pub id: Option<String>,

    #[schemars(description = "arXiv URL, e.g. \"https://arxiv.org/abs/2205.14135\"")]
    pub url: Option<String>,

    #[schemars(description = "Paper title")]
    pub title: Option<String>,

    /// If provided, skips the 3-step pipeline and uses this prompt directly.
    #[schemars(
        description = "Custom reading prompt. If provided, skips the 3-step pipeline and uses this prompt directly."
    )]
    pub prompt: Option<String>,
}

#[derive(Clone)]
pub struct PaperService {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

impl PaperService {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    async fn resolve(&self, reference: &PaperReference) -> Result<PaperContext, PaperError> {
        match self.state.searcher.resolve(reference).await? {
            Resolution::Full(ctx) => Ok(ctx),
            Resolution::TitleOnly(title) => Err(PaperError::UnresolvedTitle(title)),
        }
    }
}

#[tool_handler]
impl ServerHandler for PaperService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "NEOCORTICA resolves arXiv paper references to markdown. Use 'paper_searching' \
                 to fetch a paper's full text and 'paper_reading' for an AI analysis; both \
                 accept an id, url, or title."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl PaperService {
    #[tool(
        description = "Fetch the full markdown text of an arXiv paper. Provide at least id, url, or title."
    )]
    pub async fn paper_searching(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reference = PaperReference {
            id: request.id,
            url: request.url,
            title: request.title,
        };

        let ctx = match self.resolve(&reference).await {
            Ok(ctx) => ctx,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))])),
        };
        match self.state.searcher.paper_md(&ctx).await {
            Ok(markdown) => Ok(CallToolResult::success(vec![Content::text(markdown)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))])),
        }
    }

    #[tool(
        description = "Read an arXiv paper with AI and return structured analysis. Optionally provide a custom prompt for freeform reading."
    )]
    pub async fn paper_reading(
        &self,
        Parameters(request): Parameters<ReadRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reference = PaperReference {
            id: request.id,
            url: request.url,
            title: request.title,
        };

        let result = async {
            let ctx = self.resolve(&reference).await?;
            let markdown = self.state.searcher.paper_md(&ctx).await?;
            let response = self
                .state
                .reader
                .read(&markdown, request.prompt.as_deref())
                .await?;
            Ok::<_, PaperError>(format!("[{}]({})\n\n{}", ctx.title, ctx.url, response))
        }
        .await;

        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))])),
        }
    }
}
