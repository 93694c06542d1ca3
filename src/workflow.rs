use anyhow::{Context, Result};

use crate::config::ConfigStore;
use crate::context::StackQueryContext;
use crate::error::ConversationError;
use crate::prompts::{
    DISCOVER_IAC_FILES, ENUMERATE_RESOURCES, EXPLAIN_OUTPUT, GENERATE_COMMAND, INFER_STACK_NAME,
    ModelSelection, PromptTemplate,
};
use crate::provider::{LlmBackend, MessageRequest};
use crate::session::{ConversationState, Turn};
use crate::streaming::{ResponseEnvelope, normalize};
use crate::tools::aws_cli::AwsTarget;

pub const STAGE_MAX_TOKENS: u32 = 1024;
pub const CONTINUATION_MAX_TOKENS: u32 = 8192;

/// The fixed sequence of single-purpose prompts plus the follow-up stages
/// used by the chat loop.
pub struct PromptChain<'a> {
    backend: &'a dyn LlmBackend,
    store: &'a ConfigStore,
    models: ModelSelection,
    verbose: bool,
}

impl<'a> PromptChain<'a> {
    pub fn new(backend: &'a dyn LlmBackend, store: &'a ConfigStore, models: ModelSelection) -> Self {
        Self {
            backend,
            store,
            models,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Stage 1: asks which files of the layout hold infrastructure code.
    pub async fn discover_iac_files(
        &self,
        layout: &[String],
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let layout_json =
            serde_json::to_string_pretty(layout).context("failed to serialize project layout")?;
        let user_prompt = format!("<ProjectLayout>{layout_json}</ProjectLayout>");
        self.run_template(&DISCOVER_IAC_FILES, user_prompt, stream)
            .await
    }

    /// Stage 2: derives the deployed stack name for a stage.
    pub async fn infer_stack_name(
        &self,
        iac_bundle: &str,
        stage: &str,
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let user_prompt =
            format!("<ServerlessConfig>{iac_bundle}</ServerlessConfig>\n<Stage>{stage}</Stage>");
        self.run_template(&INFER_STACK_NAME, user_prompt, stream)
            .await
    }

    /// Stage 3: lists the resources the infrastructure code creates.
    pub async fn enumerate_resources(
        &self,
        iac_bundle: &str,
        stage: &str,
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let user_prompt =
            format!("<IaCFilesContent>{iac_bundle}</IaCFilesContent>\n<Stage>{stage}</Stage>");
        self.run_template(&ENUMERATE_RESOURCES, user_prompt, stream)
            .await
    }

    /// Stage 4: answers the first query or proposes a CLI command. Once the
    /// backend accepts the request the conversation state is written to the
    /// config store and returned.
    pub async fn generate_command(
        &self,
        context: &StackQueryContext,
        query: &str,
        target: &AwsTarget,
        stream: bool,
    ) -> Result<(ResponseEnvelope, ConversationState)> {
        let user_prompt = format!(
            "<ExistingStack>{}</ExistingStack><StackName>{}</StackName><ResourceList>{}</ResourceList>\n<UserQuery>{}</UserQuery>, <Profile>{}</Profile>, <Region>{}</Region>",
            context.stack_resources_json(),
            context.stack_name(),
            context.resource_list(),
            query,
            target.profile,
            target.region
        );
        let state = ConversationState {
            system_prompt: GENERATE_COMMAND.text.to_string(),
            model_id: self.models.model_for(GENERATE_COMMAND.tier).to_string(),
        };
        if self.verbose {
            tracing::info!(
                model = %state.model_id,
                "conversation state prepared"
            );
        }

        let envelope = self
            .run_template(&GENERATE_COMMAND, user_prompt, stream)
            .await?;
        self.store
            .save_conversation(&state)
            .context("failed to persist conversation state")?;
        Ok((envelope, state))
    }

    /// Sends the whole transcript under the persisted conversation state.
    pub async fn continue_conversation(
        &self,
        turns: &[Turn],
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let state = self
            .store
            .load_conversation()?
            .ok_or(ConversationError::NoActiveConversation)?;

        if self.verbose {
            tracing::info!(
                model = %state.model_id,
                system_prompt = %state.system_prompt,
                turns = turns.len(),
                "continuing conversation"
            );
        }

        let request = MessageRequest {
            model: state.model_id,
            system: Some(state.system_prompt),
            messages: turns.to_vec(),
            max_tokens: CONTINUATION_MAX_TOKENS,
            stream,
        };
        self.dispatch(request).await
    }

    pub async fn explain_output(
        &self,
        query: &str,
        command: &str,
        command_response: &str,
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let user_prompt = format!(
            "<UserQuery>{query}</UserQuery>\n<AwsCliCommand>{command}</AwsCliCommand>\n<CommandResponse>{command_response}</CommandResponse>"
        );
        self.run_template(&EXPLAIN_OUTPUT, user_prompt, stream)
            .await
    }

    async fn run_template(
        &self,
        template: &PromptTemplate,
        user_prompt: String,
        stream: bool,
    ) -> Result<ResponseEnvelope> {
        let model = self.models.model_for(template.tier).to_string();
        if self.verbose {
            tracing::info!(
                stage = template.name,
                model = %model,
                system_prompt = template.text,
                user_prompt = %user_prompt,
                "generating response"
            );
        } else {
            tracing::debug!(stage = template.name, model = %model, stream, "generating response");
        }

        let request =
            MessageRequest::single(model, template.text, user_prompt, STAGE_MAX_TOKENS, stream);
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: MessageRequest) -> Result<ResponseEnvelope> {
        let response = self.backend.send(request).await?;
        let envelope = normalize(response);
        if self.verbose {
            return Ok(envelope.traced());
        }
        Ok(envelope)
    }
}
