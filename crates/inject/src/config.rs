use crate::{evm::ProviderInfo, liveness::LivenessConfig};
use inject_rpc::Origins;
use serde::{Deserialize, Serialize};

/// Default name the chain-injected extension registers under in `injectedWeb3`
pub const DEFAULT_EXTENSION_NAME: &str = "subwallet-js";

/// Default global property the EVM provider is exposed under
pub const DEFAULT_EVM_GLOBAL: &str = "SubWallet";

/// Default provider name reported by `net_version`
pub const DEFAULT_PROVIDER_NAME: &str = "SubWallet";

/// Default reverse domain name announced over EIP-6963
pub const DEFAULT_RDNS: &str = "app.subwallet";

/// Default icon announced over EIP-6963, a data URI
pub const DEFAULT_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHZpZXdCb3g9IjAgMCAzMiAzMiI+PGNpcmNsZSBjeD0iMTYiIGN5PSIxNiIgcj0iMTYiIGZpbGw9IiMwMDRCRkYiLz48L3N2Zz4=";

/// Configuration of everything injected into a page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InjectConfig {
    /// Name of the entry in `injectedWeb3`
    pub name: String,
    /// Version of the extension, `None` makes `net_version` answer `null`
    pub version: Option<String>,
    /// Prefix shared by the origin tags and the request ids
    pub extension_prefix: String,
    /// Global property the EVM provider is exposed under
    pub evm_global: String,
    /// Provider name reported by `net_version`
    pub provider_name: String,
    /// The EIP-6963 announcement
    pub provider_info: ProviderInfoConfig,
    /// Keep-alive probing of the relay, disabled when `None`
    pub liveness: Option<LivenessConfig>,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_EXTENSION_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            extension_prefix: String::new(),
            evm_global: DEFAULT_EVM_GLOBAL.to_string(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_info: ProviderInfoConfig::default(),
            liveness: Some(LivenessConfig::default()),
        }
    }
}

// === impl InjectConfig ===

impl InjectConfig {
    /// Sets the name of the `injectedWeb3` entry
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the extension version
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Sets the extension prefix
    #[must_use]
    pub fn with_extension_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.extension_prefix = prefix.into();
        self
    }

    /// Sets the global property of the EVM provider
    #[must_use]
    pub fn with_evm_global(mut self, global: impl Into<String>) -> Self {
        self.evm_global = global.into();
        self
    }

    /// Sets the provider name reported by `net_version`
    #[must_use]
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Sets the EIP-6963 announcement
    #[must_use]
    pub fn with_provider_info(mut self, info: ProviderInfoConfig) -> Self {
        self.provider_info = info;
        self
    }

    /// Sets the liveness probe, `None` disables it
    #[must_use]
    pub fn with_liveness(mut self, liveness: Option<LivenessConfig>) -> Self {
        self.liveness = liveness;
        self
    }

    /// The origin tags derived from the extension prefix
    pub fn origins(&self) -> Origins {
        Origins::with_prefix(&self.extension_prefix)
    }

    /// Answer to `net_version`
    pub fn net_version(&self) -> Option<String> {
        self.version.as_ref().map(|version| format!("{} v{version}", self.provider_name))
    }
}

/// The static part of the EIP-6963 provider info, the uuid is generated per provider instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderInfoConfig {
    pub name: String,
    pub icon: String,
    pub rdns: String,
}

impl ProviderInfoConfig {
    /// Creates the announced info with a fresh uuid
    pub fn to_provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.name, &self.icon, &self.rdns)
    }
}

impl Default for ProviderInfoConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_NAME.to_string(),
            icon: DEFAULT_ICON.to_string(),
            rdns: DEFAULT_RDNS.to_string(),
        }
    }
}
