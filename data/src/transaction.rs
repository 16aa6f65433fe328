use derive_more::Display;
use enum_map::Enum;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use strum::EnumString;

/// Request body for a transaction call, keyed by wire field name (`input_*`).
pub type TransactionQuery = Map<String, Value>;

/// Wire field names.
pub mod fields {
    pub const AMOUNT: &str = "input_Amount";
    pub const COUNTRY: &str = "input_Country";
    pub const CURRENCY: &str = "input_Currency";
    pub const CUSTOMER_MSISDN: &str = "input_CustomerMSISDN";
    pub const SERVICE_PROVIDER_CODE: &str = "input_ServiceProviderCode";
    pub const THIRD_PARTY_CONVERSATION_ID: &str = "input_ThirdPartyConversationID";
    pub const TRANSACTION_REFERENCE: &str = "input_TransactionReference";
    pub const PURCHASED_ITEMS_DESC: &str = "input_PurchasedItemsDesc";
    pub const PAYMENT_ITEMS_DESC: &str = "input_PaymentItemsDesc";
    pub const PRIMARY_PARTY_CODE: &str = "input_PrimaryPartyCode";
    pub const RECEIVER_PARTY_CODE: &str = "input_ReceiverPartyCode";
    pub const REVERSAL_AMOUNT: &str = "input_ReversalAmount";
    pub const TRANSACTION_ID: &str = "input_TransactionID";
    pub const QUERY_REFERENCE: &str = "input_QueryReference";
}

use fields::*;

const C2B_FIELDS: &[&str] = &[
    AMOUNT,
    COUNTRY,
    CURRENCY,
    CUSTOMER_MSISDN,
    SERVICE_PROVIDER_CODE,
    THIRD_PARTY_CONVERSATION_ID,
    TRANSACTION_REFERENCE,
    PURCHASED_ITEMS_DESC,
];

const B2C_FIELDS: &[&str] = &[
    AMOUNT,
    COUNTRY,
    CURRENCY,
    CUSTOMER_MSISDN,
    SERVICE_PROVIDER_CODE,
    THIRD_PARTY_CONVERSATION_ID,
    TRANSACTION_REFERENCE,
    PAYMENT_ITEMS_DESC,
];

const B2B_FIELDS: &[&str] = &[
    AMOUNT,
    COUNTRY,
    CURRENCY,
    PRIMARY_PARTY_CODE,
    RECEIVER_PARTY_CODE,
    THIRD_PARTY_CONVERSATION_ID,
    TRANSACTION_REFERENCE,
    PURCHASED_ITEMS_DESC,
];

const REVERSAL_FIELDS: &[&str] = &[
    COUNTRY,
    REVERSAL_AMOUNT,
    SERVICE_PROVIDER_CODE,
    THIRD_PARTY_CONVERSATION_ID,
    TRANSACTION_ID,
];

const STATUS_FIELDS: &[&str] = &[
    COUNTRY,
    QUERY_REFERENCE,
    SERVICE_PROVIDER_CODE,
    THIRD_PARTY_CONVERSATION_ID,
];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Enum, Display, EnumString)]
pub enum TransactionKind {
    #[display("customer-to-business")]
    #[strum(serialize = "c2b", serialize = "customer-to-business")]
    CustomerToBusiness,
    #[display("business-to-customer")]
    #[strum(serialize = "b2c", serialize = "business-to-customer")]
    BusinessToCustomer,
    #[display("business-to-business")]
    #[strum(serialize = "b2b", serialize = "business-to-business")]
    BusinessToBusiness,
    #[display("payment-reversal")]
    #[strum(serialize = "reversal", serialize = "payment-reversal")]
    Reversal,
    #[display("transaction-status")]
    #[strum(serialize = "status", serialize = "transaction-status")]
    QueryTransactionStatus,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 5] = [
        TransactionKind::CustomerToBusiness,
        TransactionKind::BusinessToCustomer,
        TransactionKind::BusinessToBusiness,
        TransactionKind::Reversal,
        TransactionKind::QueryTransactionStatus,
    ];

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            TransactionKind::CustomerToBusiness => C2B_FIELDS,
            TransactionKind::BusinessToCustomer => B2C_FIELDS,
            TransactionKind::BusinessToBusiness => B2B_FIELDS,
            TransactionKind::Reversal => REVERSAL_FIELDS,
            TransactionKind::QueryTransactionStatus => STATUS_FIELDS,
        }
    }

    /// Endpoint path relative to the environment base URL.
    pub fn path(self) -> &'static str {
        match self {
            TransactionKind::CustomerToBusiness => "c2bPayment/singleStage/",
            TransactionKind::BusinessToCustomer => "b2cPayment/",
            TransactionKind::BusinessToBusiness => "b2bPayment/",
            TransactionKind::Reversal => "reversal/",
            TransactionKind::QueryTransactionStatus => "queryTransactionStatus/",
        }
    }

    /// Required keys absent from `query`. Empty means the query may be sent.
    pub fn missing_fields(self, query: &TransactionQuery) -> BTreeSet<&'static str> {
        self.required_fields()
            .iter()
            .copied()
            .filter(|field| !query.contains_key(*field))
            .collect()
    }
}
