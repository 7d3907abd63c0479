//! Prompt Templates for AI Operations
//!
//! The screenshot breakdown uses one fixed instruction and a JSON response
//! schema; the model only fills `region` and `functionName` and leaves the
//! remaining columns for the user.

use serde_json::json;

/// Instruction sent with every screenshot
pub const SCREENSHOT_ANALYSIS_PROMPT: &str = r#"作为一名高级产品经理，请分析这张 UI 界面截图，并将其拆解为产品需求列表（PRD）。

请按照视觉区域对功能进行分组（例如："查询条件区"、"数据列表区"、"导航栏"、"操作区"）。

过滤规则：
- 忽略纯技术组件区域，如"分页器"、"页面消息提示"、"全局 Toast"、"面包屑导航"。
- 只关注具体的业务功能点。

对于每个识别到的功能点（输入框标签、按钮文字、表头字段等）：
1. region：所属区域名称（中文）。
2. functionName：界面上显示的名称（字段名或按钮名）。
3. description、interaction、validation、scope 保持为空字符串，留给用户后续填写。

只返回符合给定结构的 JSON 数组。"#;

/// Field names of one response record, in schema order
pub const RECORD_FIELDS: [&str; 6] = [
    "region",
    "functionName",
    "description",
    "interaction",
    "validation",
    "scope",
];

/// Fields every response record must carry
pub const REQUIRED_FIELDS: [&str; 2] = ["region", "functionName"];

/// Response schema: an array of requirement records
pub fn build_response_schema() -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = RECORD_FIELDS
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": REQUIRED_FIELDS,
        }
    })
}
