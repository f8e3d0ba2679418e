//! 数据集名解析

use crate::model::Configuration;

/// 无法从配置推断时使用的名称
pub const UNKNOWN_DATASET: &str = "unknown_dataset";

/// 从 tags 类型的 circumstance 中取表名，否则退回配置名
///
/// 标签形如 `Data Entity.PO.Table.<schema>.<table>`，取最后一段。
pub fn dataset_name(config: &Configuration) -> String {
    let table_tag = config
        .circumstances
        .iter()
        .filter(|c| c.kind.as_deref() == Some("tags"))
        .filter_map(|c| c.tag.as_deref())
        .find(|tag| tag.contains("Table."));

    if let Some(tag) = table_tag
        && let Some(last) = tag.rsplit('.').next()
    {
        return last.to_string();
    }

    match &config.name {
        Some(name) => name.replace(' ', "_").replace(':', ""),
        None => UNKNOWN_DATASET.to_string(),
    }
}
