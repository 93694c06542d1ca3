//! Instruction templates for each stage of the prompt chain, plus the
//! tier and alias tables that turn a template into a concrete model id.

use anyhow::Result;

pub const WEAK_MODEL_ID: &str = "claude-3-haiku-20240307";
pub const MIDDLE_MODEL_ID: &str = "claude-3-opus-20240229";
pub const STRONG_MODEL_ID: &str = "claude-3-5-sonnet-20241022";

pub const DEFAULT_MODEL_ALIAS: &str = "haiku-3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Weak,
    Middle,
    Strong,
}

/// Static tier mapping. A missing tier resolves to the weak model.
pub fn model_for_tier(tier: Option<ModelTier>) -> &'static str {
    match tier {
        Some(ModelTier::Middle) => MIDDLE_MODEL_ID,
        Some(ModelTier::Strong) => STRONG_MODEL_ID,
        Some(ModelTier::Weak) | None => WEAK_MODEL_ID,
    }
}

pub const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-3-haiku", "claude-3-haiku-20240307"),
    ("haiku-3", "claude-3-haiku-20240307"),
    ("claude-3-sonnet", "claude-3-sonnet-20240229"),
    ("sonnet-3", "claude-3-sonnet-20240229"),
    ("claude-3-opus", "claude-3-opus-20240229"),
    ("opus-3", "claude-3-opus-20240229"),
    ("claude-3.5-sonnet", "claude-3-5-sonnet-20241022"),
    ("sonnet-3.5", "claude-3-5-sonnet-20241022"),
    ("claude-3.5-sonnet-legacy", "claude-3-5-sonnet-20240620"),
    ("sonnet-3.5-legacy", "claude-3-5-sonnet-20240620"),
    ("claude-3.5-sonnet-latest", "claude-3-5-sonnet-latest"),
    ("sonnet-3.5-latest", "claude-3-5-sonnet-latest"),
];

/// Accepts a short alias or a literal `claude-*` model id.
pub fn resolve_model_alias(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if let Some((_, model)) = MODEL_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
    {
        return Ok((*model).to_string());
    }
    if trimmed.starts_with("claude-") {
        return Ok(trimmed.to_string());
    }
    let known = MODEL_ALIASES
        .iter()
        .map(|(alias, _)| *alias)
        .collect::<Vec<_>>()
        .join(", ");
    Err(anyhow::anyhow!(
        "unknown model '{trimmed}'. Known aliases: {known}"
    ))
}

/// Per-session tier table. `--model` replaces the weak tier's model; the
/// other tiers always come from [`model_for_tier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub weak: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            weak: model_for_tier(Some(ModelTier::Weak)).to_string(),
        }
    }
}

impl ModelSelection {
    pub fn from_alias(alias: &str) -> Result<Self> {
        Ok(Self {
            weak: resolve_model_alias(alias)?,
        })
    }

    /// The model picked with `--model`, shown to the operator at startup.
    pub fn selected(&self) -> &str {
        &self.weak
    }

    pub fn model_for(&self, tier: Option<ModelTier>) -> &str {
        match tier {
            Some(ModelTier::Weak) | None => &self.weak,
            tier => model_for_tier(tier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
    pub tier: Option<ModelTier>,
}

pub const DISCOVER_IAC_FILES: PromptTemplate = PromptTemplate {
    name: "discover_iac_files",
    text: "Above is a project layout of an AWS serverless project in the <ProjectLayout> tag.
Tell me the names of the files handling IaC in this project.
Give me only comma separated file names without any backticks or quotes.
Those files can be serverless.yml, CDK files or terraform files.",
    tier: Some(ModelTier::Weak),
};

pub const INFER_STACK_NAME: PromptTemplate = PromptTemplate {
    name: "infer_stack_name",
    text: "Infer the CloudFormation stack name from the serverless configuration in the <ServerlessConfig> tag for the stage given in the <Stage> tag.
Assume it has already been deployed on that stage.
Only give me the stack name and nothing else.",
    tier: Some(ModelTier::Weak),
};

pub const ENUMERATE_RESOURCES: PromptTemplate = PromptTemplate {
    name: "enumerate_resources",
    text: "Based on the content of the IaC files provided in the <IaCFilesContent> tag, list all the resources created by this IaC.
Each file's content is enclosed in XML tags with the file name as the tag name.
I only need the names mentioned in the files and the actual names of the resources as if the stack managed by the IaC files is already deployed in the given stage.
If a name is stage specific, the stage is provided in the <Stage> tag.
E.g. UserPhotosBucket: user-photos-dev
Pay attention to the file names and their hierarchies as indicated by the XML tags.
Give me only resources. This output is passed to the next prompt, so do not include anything that could confuse it.",
    tier: Some(ModelTier::Strong),
};

pub const GENERATE_COMMAND: PromptTemplate = PromptTemplate {
    name: "generate_command",
    text: "You have the resources list in the <ResourceList> tag.
The existing deployed CloudFormation stack is in the <ExistingStack> tag.
Stack resources are in the <StackResources> tag.
The user query is in the <UserQuery> tag.
Based on the resources, the existing stack, the stack resources and the query, answer the question of the user, defaulting to an answer from the existing resources.
If an AWS CLI command would give more clarity, respond with a CLI command that helps answer the query; the user will run the command and provide you the output.
If you are creating a CLI command, start with the text command: otherwise start with the text answer:
Your response must always start with one of these two words and nothing else.
When creating an AWS CLI command, it must always return JSON output and must use the profile in the <Profile> tag and the region in the <Region> tag.
The command runs through a POSIX sh with jq installed; you may use it to shape the output.",
    tier: Some(ModelTier::Strong),
};

pub const EXPLAIN_OUTPUT: PromptTemplate = PromptTemplate {
    name: "explain_output",
    text: "You have the following things with you.
The user query in the <UserQuery> tag.
An AWS CLI command in the <AwsCliCommand> tag.
A tool has already run the command and its response is in the <CommandResponse> tag.
Explain the output of this command in an <OutputExplanation> tag in such a way that it answers the user query.",
    tier: Some(ModelTier::Strong),
};
