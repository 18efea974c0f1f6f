use seekloop_model::{
    ChatRequest, Message, ResponseFormat, Stop, StreamOptions, ToolChoice,
    ToolDefinition,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
struct FunctionTool<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Tool<'a> {
    r#type: &'static str,
    function: FunctionTool<'a>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a Stop>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_logprobs: Option<u8>,
}

// ------------------------------
// Types received from the server
// ------------------------------

/// The models available to the account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelList {
    /// The object type, always `list`.
    pub object: String,
    /// The models.
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

/// A model available to the account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The model identifier, e.g. `deepseek-chat`.
    pub id: String,
    /// The object type, always `model`.
    pub object: String,
    /// The organization that owns the model.
    pub owned_by: String,
}

/// The balance of the account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserBalance {
    /// Whether the balance is sufficient for API calls.
    pub is_available: bool,
    /// Balances per currency.
    #[serde(default)]
    pub balance_infos: Vec<BalanceInfo>,
}

/// The balance in one currency.
///
/// Amounts are kept as the decimal strings the service sends.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// `CNY` or `USD`.
    pub currency: String,
    /// The total available balance.
    pub total_balance: String,
    /// The granted balance that has not expired.
    pub granted_balance: String,
    /// The balance topped up by the user.
    pub topped_up_balance: String,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ChatRequest) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: &req.model,
        messages: &req.messages,
        frequency_penalty: req.frequency_penalty,
        max_tokens: req.max_tokens,
        presence_penalty: req.presence_penalty,
        response_format: req.response_format,
        stop: req.stop.as_ref(),
        stream: req.stream,
        stream_options: req.stream_options,
        temperature: req.temperature,
        top_p: req.top_p,
        tools: req.tools.iter().map(create_tool).collect(),
        tool_choice: req.tool_choice.as_ref(),
        logprobs: req.logprobs,
        top_logprobs: req.top_logprobs,
    }
}

#[inline]
fn create_tool(tool: &ToolDefinition) -> Tool<'_> {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: &tool.name,
            description: &tool.description,
            parameters: &tool.parameters,
        },
    }
}
