//! Wallet provider implementations.
//!
//! Two ways to hold a signing identity: a private key in process memory
//! ([`local::LocalWallet`]) or a remote custodial signing service
//! ([`custodial::CustodialWallet`]). [`wallet_from_config`] picks one from
//! persisted client configuration and resolves its secrets from the
//! environment.

pub mod custodial;
pub mod local;

use url::Url;
use workpay::config::{ClientConfig, WalletConfig, resolve_secret};
use workpay::wallet::{WalletError, WalletProvider};

use self::custodial::CustodialWallet;
use self::local::LocalWallet;

/// Builds the wallet provider a client configuration selects.
///
/// Secrets are resolved from the environment variables the configuration
/// names. The returned provider still needs [`WalletProvider::init`]
/// before first use.
///
/// # Errors
///
/// Returns [`WalletError::Config`] for unresolvable secrets or malformed
/// URLs, and [`WalletError::Credentials`] for an unparseable private key.
pub fn wallet_from_config(config: &ClientConfig) -> Result<Box<dyn WalletProvider>, WalletError> {
    match &config.wallet {
        WalletConfig::Local {
            private_key_env,
            rpc_url,
        } => {
            let key = resolve_secret(private_key_env)
                .map_err(|e| WalletError::Config(e.to_string()))?;
            let rpc_url = rpc_url
                .as_deref()
                .map(Url::parse)
                .transpose()
                .map_err(|e| WalletError::Config(format!("rpc url: {e}")))?;
            let wallet = LocalWallet::connect(&key, config.network, rpc_url)?;
            Ok(Box::new(wallet))
        }
        WalletConfig::Custodial {
            service_url,
            api_key_id,
            api_key_secret_env,
            wallet_id,
        } => {
            let secret = resolve_secret(api_key_secret_env)
                .map_err(|e| WalletError::Config(e.to_string()))?;
            let service_url = Url::parse(service_url)
                .map_err(|e| WalletError::Config(format!("service url: {e}")))?;
            let wallet = CustodialWallet::new(
                service_url,
                api_key_id.clone(),
                secret,
                wallet_id.clone(),
                config.network,
            )?;
            Ok(Box::new(wallet))
        }
    }
}
