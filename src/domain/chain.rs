//! 链标识与链目录
//!
//! ChainId 是不透明字符串，只能通过注册表给出的集合判断合法性

use std::{collections::HashSet, fmt};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 链标识符（如 ETH、POLYGON、Holesky）
///
/// 比较区分大小写，与注册表中的写法保持一致
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 链展示信息（Supported Chains 页面使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    #[schema(value_type = String)]
    pub id: ChainId,
    /// 原生代币符号
    pub native_token: String,
    /// 区块浏览器地址
    #[serde(default)]
    pub explorer_url: Option<String>,
}

impl ChainInfo {
    pub fn new(id: &str, native_token: &str, explorer_url: Option<&str>) -> Self {
        Self {
            id: ChainId::new(id),
            native_token: native_token.to_string(),
            explorer_url: explorer_url.map(str::to_string),
        }
    }

    /// 仅有标识符时的占位信息（上游只返回字符串列表时使用）
    pub fn bare(id: impl Into<String>) -> Self {
        let id = ChainId::new(id);
        Self {
            native_token: id.as_str().to_string(),
            id,
            explorer_url: None,
        }
    }
}

/// 默认链目录
static DEFAULT_CATALOG: Lazy<Vec<ChainInfo>> = Lazy::new(|| {
    vec![
        ChainInfo::new("ETH", "ETH", Some("https://sepolia.etherscan.io")),
        ChainInfo::new("POLYGON", "POL", Some("https://polygonscan.com")),
        ChainInfo::new("BNB", "BNB", Some("https://bscscan.com")),
        ChainInfo::new("OP", "ETH", Some("https://optimistic.etherscan.io")),
        ChainInfo::new("BASE", "ETH", Some("https://basescan.org")),
        ChainInfo::new("ARB", "ETH", Some("https://arbiscan.io")),
        ChainInfo::new("Holesky", "ETH", Some("https://holesky.etherscan.io")),
    ]
});

pub fn default_catalog() -> Vec<ChainInfo> {
    DEFAULT_CATALOG.clone()
}

/// 已加载的链集合
///
/// 保留注册表给出的顺序用于展示，成员判断走哈希集合
#[derive(Debug, Clone, Default)]
pub struct ChainSet {
    chains: Vec<ChainInfo>,
    ids: HashSet<ChainId>,
}

impl ChainSet {
    /// 构建链集合，重复的标识符只保留第一次出现
    pub fn new(chains: Vec<ChainInfo>) -> Self {
        let mut ids = HashSet::with_capacity(chains.len());
        let chains = chains
            .into_iter()
            .filter(|c| !c.id.is_empty() && ids.insert(c.id.clone()))
            .collect();
        Self { chains, ids }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(ChainInfo::bare).collect())
    }

    pub fn contains(&self, id: &ChainId) -> bool {
        self.ids.contains(id)
    }

    pub fn contains_str(&self, id: &str) -> bool {
        self.ids.contains(&ChainId::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&ChainInfo> {
        self.chains.iter().find(|c| c.id.as_str() == id)
    }

    pub fn chains(&self) -> &[ChainInfo] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
