use alloy_primitives::{address, U256};
use error_stack::Report;
use mockall::predicate::eq;

use crate::config::PopulateConfig;
use crate::constants::GWEI;
use crate::errors::{ErrorCode, PopulateError, ProviderError, TransactionContext};
use crate::populate::populate_transaction;
use crate::provider::MockChainDataProvider;
use crate::types::{BlockTag, FeeData, FeeScheme, TransactionRequest, TxType};

fn fee_market_data() -> FeeData {
    FeeData {
        gas_price: Some(20 * GWEI),
        max_fee_per_gas: Some(42 * GWEI),
        max_priority_fee_per_gas: Some(2 * GWEI),
    }
}

fn legacy_fee_data() -> FeeData {
    FeeData { gas_price: Some(20 * GWEI), ..Default::default() }
}

fn transfer() -> TransactionRequest {
    TransactionRequest {
        from: Some(address!("0000000000000000000000000000000000000001")),
        to: Some(address!("0000000000000000000000000000000000000002")),
        value: U256::from(1_000_000_000_000_000u64),
        ..Default::default()
    }
}

/// Mock that answers nonce, gas and chain id lookups once each
fn provider_with_fills(chain_id: u64) -> MockChainDataProvider {
    let mut provider = MockChainDataProvider::new();
    provider
        .expect_get_transaction_count()
        .with(eq(BlockTag::Pending))
        .times(1)
        .returning(|_| Ok(7));
    provider.expect_estimate_gas().times(1).returning(|_| Ok(21_000));
    provider.expect_get_chain_id().times(1).returning(move || Ok(chain_id));
    provider
}

#[tokio::test]
async fn test_complete_fee_market_fields_skip_fee_lookups() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().never();
    provider.expect_get_gas_price().never();

    let request = TransactionRequest {
        tx_type: Some(TxType::FeeMarket),
        max_fee_per_gas: Some(30 * GWEI),
        max_priority_fee_per_gas: Some(GWEI),
        ..transfer()
    };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();

    assert_eq!(populated.tx_type, Some(TxType::FeeMarket));
    assert_eq!(populated.max_fee_per_gas, Some(30 * GWEI));
    assert_eq!(populated.max_priority_fee_per_gas, Some(GWEI));
    assert_eq!(populated.gas_price, None);
    assert_eq!(populated.nonce, Some(7));
    assert_eq!(populated.gas_limit, Some(21_000));
    assert_eq!(populated.chain_id, Some(1));
}

#[tokio::test]
async fn test_untyped_complete_fee_market_fields_resolve_type_two() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().never();

    let request = TransactionRequest {
        max_fee_per_gas: Some(30 * GWEI),
        max_priority_fee_per_gas: Some(GWEI),
        ..transfer()
    };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();
    assert_eq!(populated.tx_type, Some(TxType::FeeMarket));
}

#[tokio::test]
async fn test_gas_price_with_type_two_fails_before_any_lookup() {
    // No expectations: any lookup would panic
    let provider = MockChainDataProvider::new();

    let request =
        TransactionRequest { tx_type: Some(TxType::FeeMarket), gas_price: Some(GWEI), ..transfer() };

    let error = populate_transaction(&provider, &request, &PopulateConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(error.current_context(), PopulateError::IncompatibleFeeFields(_)));

    let context = error.downcast_ref::<TransactionContext>().unwrap();
    assert_eq!(context.gas_price, Some(GWEI));
}

#[tokio::test]
async fn test_fee_market_fields_on_legacy_type_fail_before_any_lookup() {
    let provider = MockChainDataProvider::new();

    let request = TransactionRequest {
        tx_type: Some(TxType::AccessList),
        max_priority_fee_per_gas: Some(GWEI),
        ..transfer()
    };

    let error = populate_transaction(&provider, &request, &PopulateConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(error.current_context(), PopulateError::IncompatibleFeeFields(_)));
}

#[tokio::test]
async fn test_legacy_gas_price_upgraded_on_fee_market_network() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| Ok(fee_market_data()));
    provider.expect_get_gas_price().never();

    let request = TransactionRequest { gas_price: Some(15 * GWEI), ..transfer() };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();

    assert_eq!(populated.tx_type, Some(TxType::FeeMarket));
    assert_eq!(populated.gas_price, None);
    assert_eq!(populated.max_fee_per_gas, Some(15 * GWEI));
    assert_eq!(populated.max_priority_fee_per_gas, Some(15 * GWEI));
}

#[tokio::test]
async fn test_untyped_request_takes_fee_data_on_fee_market_network() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| Ok(fee_market_data()));

    let populated = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap();

    assert_eq!(populated.tx_type, Some(TxType::FeeMarket));
    assert_eq!(
        populated.fee_scheme(),
        Some(FeeScheme::FeeMarket {
            max_fee_per_gas: 42 * GWEI,
            max_priority_fee_per_gas: 2 * GWEI
        })
    );
    assert!(populated.is_populated());
}

#[tokio::test]
async fn test_untyped_request_on_legacy_network() {
    let mut provider = provider_with_fills(56);
    provider.expect_get_fee_data().times(1).returning(|| Ok(legacy_fee_data()));

    let populated = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap();

    assert_eq!(populated.tx_type, Some(TxType::Legacy));
    assert_eq!(populated.gas_price, Some(20 * GWEI));
    assert_eq!(populated.max_fee_per_gas, None);
    assert_eq!(populated.chain_id, Some(56));
}

#[tokio::test]
async fn test_fee_market_field_on_legacy_network_is_unsupported() {
    let mut provider = provider_with_fills(56);
    provider.expect_get_fee_data().times(1).returning(|| Ok(legacy_fee_data()));

    let request = TransactionRequest { max_fee_per_gas: Some(30 * GWEI), ..transfer() };

    let error = populate_transaction(&provider, &request, &PopulateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(error.current_context(), &PopulateError::UnsupportedFeeMarket);
}

#[tokio::test]
async fn test_fee_data_without_any_scheme_is_inconsistent() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| Ok(FeeData::default()));

    let error = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(error.current_context(), &PopulateError::InconsistentFeeData);
}

#[tokio::test]
async fn test_explicit_legacy_type_fetches_gas_price() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().never();
    provider.expect_get_gas_price().times(1).returning(|| Ok(9 * GWEI));

    let request = TransactionRequest { tx_type: Some(TxType::AccessList), ..transfer() };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();
    assert_eq!(populated.tx_type, Some(TxType::AccessList));
    assert_eq!(populated.gas_price, Some(9 * GWEI));
}

#[tokio::test]
async fn test_explicit_type_two_fills_missing_field() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| Ok(fee_market_data()));

    let request = TransactionRequest {
        tx_type: Some(TxType::FeeMarket),
        max_fee_per_gas: Some(100 * GWEI),
        ..transfer()
    };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();
    assert_eq!(populated.max_fee_per_gas, Some(100 * GWEI));
    assert_eq!(populated.max_priority_fee_per_gas, Some(2 * GWEI));
}

#[tokio::test]
async fn test_chain_id_mismatch() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_chain_id().times(1).returning(|| Ok(1));

    let request = TransactionRequest {
        tx_type: Some(TxType::Legacy),
        gas_price: Some(GWEI),
        nonce: Some(0),
        gas_limit: Some(21_000),
        chain_id: Some(5),
        ..transfer()
    };

    let error = populate_transaction(&provider, &request, &PopulateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &PopulateError::ChainIdMismatch { requested: 5, network: 1 }
    );
}

#[tokio::test]
async fn test_zero_network_chain_id_keeps_callers_chain_id() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_chain_id().times(1).returning(|| Ok(0));

    let request = TransactionRequest {
        tx_type: Some(TxType::Legacy),
        gas_price: Some(GWEI),
        nonce: Some(0),
        gas_limit: Some(21_000),
        chain_id: Some(5),
        ..transfer()
    };

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();
    assert_eq!(populated.chain_id, Some(5));
}

#[tokio::test]
async fn test_repopulating_only_confirms_chain_id() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| Ok(fee_market_data()));
    let populated = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap();

    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().never();
    provider.expect_get_gas_price().never();
    provider.expect_get_transaction_count().never();
    provider.expect_estimate_gas().never();
    provider.expect_get_chain_id().times(1).returning(|| Ok(1));

    let repopulated = populate_transaction(&provider, &populated, &PopulateConfig::default())
        .await
        .unwrap();
    assert_eq!(repopulated, populated);
}

#[tokio::test]
async fn test_estimation_sees_the_callers_draft() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().times(1).returning(|| Ok(fee_market_data()));
    provider.expect_get_transaction_count().times(1).returning(|_| Ok(3));
    provider
        .expect_estimate_gas()
        .withf(|request| request.tx_type.is_none() && request.nonce.is_none())
        .times(1)
        .returning(|_| Ok(50_000));
    provider.expect_get_chain_id().times(1).returning(|| Ok(1));

    let populated = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap();
    assert_eq!(populated.gas_limit, Some(50_000));
}

#[tokio::test]
async fn test_forwarded_estimation_error_is_returned_unchanged() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().returning(|| Ok(fee_market_data()));
    provider.expect_get_transaction_count().returning(|_| Ok(0));
    provider.expect_get_chain_id().returning(|| Ok(1));
    provider.expect_estimate_gas().times(1).returning(|_| {
        Err(Report::new(ProviderError::new(
            ErrorCode::InsufficientFunds,
            "insufficient funds for gas * price + value",
        )))
    });

    let error = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &PopulateError::Provider(ProviderError::new(
            ErrorCode::InsufficientFunds,
            "insufficient funds for gas * price + value"
        ))
    );
}

#[tokio::test]
async fn test_other_estimation_errors_are_wrapped() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().returning(|| Ok(fee_market_data()));
    provider.expect_get_transaction_count().returning(|_| Ok(0));
    provider.expect_get_chain_id().returning(|| Ok(1));
    provider.expect_estimate_gas().times(1).returning(|_| {
        Err(Report::new(ProviderError::new(ErrorCode::CallException, "execution reverted")))
    });

    let error = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(error.current_context(), &PopulateError::GasEstimationFailed);

    let rendered = format!("{:?}", error);
    assert!(rendered.contains("execution reverted"));
}

#[tokio::test]
async fn test_forwarded_set_is_configurable() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().returning(|| Ok(fee_market_data()));
    provider.expect_get_transaction_count().returning(|_| Ok(0));
    provider.expect_get_chain_id().returning(|| Ok(1));
    provider.expect_estimate_gas().times(1).returning(|_| {
        Err(Report::new(ProviderError::new(ErrorCode::CallException, "execution reverted")))
    });

    let config = PopulateConfig::default().with_forwarded_errors([ErrorCode::CallException]);
    let error = populate_transaction(&provider, &transfer(), &config).await.unwrap_err();
    assert!(matches!(
        error.current_context(),
        PopulateError::Provider(ProviderError { code: ErrorCode::CallException, .. })
    ));
}

#[tokio::test]
async fn test_failed_lookup_fails_the_call_after_every_lookup_settles() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().times(1).returning(|| {
        Err(Report::new(ProviderError::new(ErrorCode::Timeout, "fee data timed out")))
    });

    let request = transfer();
    let error = populate_transaction(&provider, &request, &PopulateConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        PopulateError::Provider(ProviderError { code: ErrorCode::Timeout, .. })
    ));
    // The draft is untouched and the nonce, gas and chain id expectations
    // (times(1)) are verified when the mock drops
    assert_eq!(request, transfer());
}

#[tokio::test]
async fn test_nonce_lookup_failure_is_reported() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().returning(|| Ok(fee_market_data()));
    provider.expect_estimate_gas().returning(|_| Ok(21_000));
    provider.expect_get_chain_id().returning(|| Ok(1));
    provider.expect_get_transaction_count().returning(|_| {
        Err(Report::new(ProviderError::new(ErrorCode::ServerError, "header not found")))
    });

    let error = populate_transaction(&provider, &transfer(), &PopulateConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        error.current_context(),
        PopulateError::Provider(ProviderError { code: ErrorCode::ServerError, .. })
    ));
    assert!(format!("{:?}", error).contains("Fetching pending nonce"));
}

#[tokio::test]
async fn test_request_left_untouched_on_success() {
    let mut provider = provider_with_fills(1);
    provider.expect_get_fee_data().returning(|| Ok(fee_market_data()));

    let request = TransactionRequest { gas_price: Some(3 * GWEI), ..transfer() };
    let before = request.clone();

    let populated =
        populate_transaction(&provider, &request, &PopulateConfig::default()).await.unwrap();

    assert_eq!(request, before);
    assert_eq!(populated.value, before.value);
    assert_eq!(populated.to, before.to);
    assert_eq!(populated.from, before.from);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_provider() {
    let mut provider = MockChainDataProvider::new();
    provider.expect_get_fee_data().times(2).returning(|| Ok(fee_market_data()));
    provider.expect_get_gas_price().times(1).returning(|| Ok(GWEI));
    provider.expect_get_transaction_count().times(3).returning(|_| Ok(1));
    provider.expect_estimate_gas().times(3).returning(|_| Ok(21_000));
    provider.expect_get_chain_id().times(3).returning(|| Ok(1));

    let config = PopulateConfig::default();
    let untyped = transfer();
    let legacy = TransactionRequest { tx_type: Some(TxType::Legacy), ..transfer() };
    let partial = TransactionRequest { max_fee_per_gas: Some(GWEI), ..transfer() };

    let (first, second) = futures::join!(
        populate_transaction(&provider, &untyped, &config),
        populate_transaction(&provider, &legacy, &config),
    );
    assert_eq!(first.unwrap().tx_type, Some(TxType::FeeMarket));
    assert_eq!(second.unwrap().tx_type, Some(TxType::Legacy));

    let third = populate_transaction(&provider, &partial, &config).await.unwrap();
    assert_eq!(third.max_fee_per_gas, Some(GWEI));
    assert_eq!(third.max_priority_fee_per_gas, Some(2 * GWEI));
}
