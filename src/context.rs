//! Accumulated facts about the project and its deployed stack.
//!
//! Each discovery step returns an extended copy; earlier values are never
//! rewritten.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackQueryContext {
    pub project_layout: Vec<String>,
    pub iac_bundle: Option<String>,
    pub stack_name: Option<String>,
    pub stack_resources: Option<Value>,
    pub resource_list: Option<String>,
}

impl StackQueryContext {
    pub fn from_layout(project_layout: Vec<String>) -> Self {
        Self {
            project_layout,
            ..Self::default()
        }
    }

    pub fn with_iac_bundle(&self, bundle: impl Into<String>) -> Self {
        Self {
            iac_bundle: Some(bundle.into()),
            ..self.clone()
        }
    }

    pub fn with_stack_name(&self, stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: Some(stack_name.into()),
            ..self.clone()
        }
    }

    pub fn with_stack_resources(&self, resources: Value) -> Self {
        Self {
            stack_resources: Some(resources),
            ..self.clone()
        }
    }

    pub fn with_resource_list(&self, resource_list: impl Into<String>) -> Self {
        Self {
            resource_list: Some(resource_list.into()),
            ..self.clone()
        }
    }

    pub fn iac_bundle(&self) -> &str {
        self.iac_bundle.as_deref().unwrap_or_default()
    }

    pub fn stack_name(&self) -> &str {
        self.stack_name.as_deref().unwrap_or_default()
    }

    pub fn resource_list(&self) -> &str {
        self.resource_list.as_deref().unwrap_or_default()
    }

    /// Compact JSON of the live stack resources, `null` when not yet listed.
    pub fn stack_resources_json(&self) -> String {
        self.stack_resources
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string())
    }

    /// Opening user turn of a chat, recorded after the first query is answered.
    pub fn opening_user_message(&self, query: &str) -> String {
        format!(
            "<ResourceList>{}</ResourceList>\n<ExistingStack>{}</ExistingStack>\n<StackResources>{}</StackResources>\n<UserQuery>{}</UserQuery>",
            self.resource_list(),
            self.stack_name(),
            self.stack_resources_json(),
            query
        )
    }
}
