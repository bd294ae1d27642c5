//! Typed request/response surface for the boundary contracts.
//!
//! Every entry point resolves the caller's session through the identity
//! collaborator, validates the request shape, and maps error *kinds* to
//! transport status codes. The HTTP server itself lives outside this
//! core; these handlers are what it delegates to.

use std::sync::Arc;

use openescrow_types::{
    ErrorKind, EscrowStatus, OpenescrowError, OrderId, OrderStatus, ProductId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coordinator::EscrowCoordinator;
use crate::external::IdentityResolver;

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub fulfillment: openescrow_types::FulfillmentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub total_amount: Decimal,
    pub product_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub order_id: OrderId,
    pub escrow: EscrowStatus,
    pub proof_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDeliveryRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDeliveryResponse {
    pub order_id: OrderId,
    pub escrow: EscrowStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub pickup_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub status: OrderStatus,
    pub escrow: EscrowStatus,
}

/// A failed request, ready for the transport layer: a status code, a
/// machine-branchable reason, and the human-readable detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRejection {
    pub status: u16,
    pub reason: String,
    pub detail: String,
}

impl From<OpenescrowError> for ApiRejection {
    fn from(err: OpenescrowError) -> Self {
        let (status, reason) = match err.kind() {
            ErrorKind::NotFound => (404, "NOT_FOUND"),
            ErrorKind::Forbidden => (403, "FORBIDDEN"),
            ErrorKind::Conflict => (409, "CONFLICT"),
            ErrorKind::ExternalDependency => (502, "UPSTREAM_FAILURE"),
            ErrorKind::Internal => (500, "INTERNAL"),
            ErrorKind::InvalidState => match err {
                OpenescrowError::TokenExpired => (400, "EXPIRED"),
                OpenescrowError::TokenMismatch { .. }
                | OpenescrowError::TokenMalformed
                | OpenescrowError::TokenWrongKey => (400, "MISMATCH"),
                _ => (400, "WRONG_STATE"),
            },
        };
        Self {
            status,
            reason: reason.to_string(),
            detail: err.to_string(),
        }
    }
}

type ApiResult<T> = std::result::Result<T, ApiRejection>;

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Session-resolving front door over the coordinator.
pub struct Gateway {
    coordinator: Arc<EscrowCoordinator>,
    identity: Arc<dyn IdentityResolver>,
}

impl Gateway {
    #[must_use]
    pub fn new(coordinator: Arc<EscrowCoordinator>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            coordinator,
            identity,
        }
    }

    /// `POST /orders`
    pub fn create_order(
        &self,
        session: &str,
        req: &CreateOrderRequest,
    ) -> ApiResult<CreateOrderResponse> {
        let ctx = self.identity.resolve(session)?;
        let product = self.coordinator.catalog().get(req.product_id)?;
        let order =
            self.coordinator
                .checkout(&ctx, req.product_id, req.quantity, req.fulfillment)?;
        Ok(CreateOrderResponse {
            order_id: order.id,
            total_amount: order.amount,
            product_title: product.title,
        })
    }

    /// `POST /payments/verify` — provider-authenticated webhook; no user
    /// session involved.
    pub fn verify_payment(&self, req: &VerifyPaymentRequest) -> ApiResult<VerifyPaymentResponse> {
        let order = self.coordinator.confirm_payment(&req.reference)?;
        let proof_token = order
            .proof_token
            .clone()
            .ok_or_else(|| OpenescrowError::Internal("held order lost its token".into()))?;
        Ok(VerifyPaymentResponse {
            order_id: order.id,
            escrow: order.escrow,
            proof_token,
        })
    }

    /// `POST /delivery/verify`
    pub fn verify_delivery(
        &self,
        session: &str,
        req: &VerifyDeliveryRequest,
    ) -> ApiResult<VerifyDeliveryResponse> {
        let ctx = self.identity.resolve(session)?;
        let order = self.coordinator.verify_delivery(&ctx, &req.token)?;
        Ok(VerifyDeliveryResponse {
            order_id: order.id,
            escrow: order.escrow,
        })
    }

    /// `POST /missions/{orderId}/claim` — courier identity comes from the
    /// session, never the body.
    pub fn claim_mission(&self, session: &str, order_id: OrderId) -> ApiResult<ClaimResponse> {
        let ctx = self.identity.resolve(session)?;
        let receipt = self.coordinator.claim(&ctx, order_id)?;
        Ok(ClaimResponse {
            pickup_code: receipt.pickup_code,
        })
    }

    /// `POST /orders/{orderId}/cancel`
    pub fn cancel_order(&self, session: &str, order_id: OrderId) -> ApiResult<CancelResponse> {
        let ctx = self.identity.resolve(session)?;
        let order = self.coordinator.cancel_order(&ctx, order_id)?;
        Ok(CancelResponse {
            status: order.status,
            escrow: order.escrow,
        })
    }
}

#[cfg(test)]
mod tests {
    use openescrow_types::{
        AuthContext, EscrowConfig, FulfillmentKind, PartyId,
    };

    use crate::catalog::Product;
    use crate::external::testing::{StubIdentityResolver, StubNotifier, StubPaymentProvider};

    use super::*;

    struct Rig {
        gateway: Gateway,
        coordinator: Arc<EscrowCoordinator>,
        payments: Arc<StubPaymentProvider>,
        product: Product,
    }

    const BUYER: &str = "session-buyer";
    const SELLER: &str = "session-seller";
    const COURIER: &str = "session-courier";

    fn rig() -> Rig {
        let payments = Arc::new(StubPaymentProvider::new());
        let identity = Arc::new(StubIdentityResolver::new());
        let coordinator = Arc::new(
            EscrowCoordinator::new(
                EscrowConfig::default(),
                &[4u8; 32],
                Arc::clone(&payments) as Arc<dyn crate::external::PaymentProvider>,
                Arc::new(StubNotifier::new()),
            )
            .unwrap(),
        );

        let seller = PartyId::new();
        identity.grant(BUYER, AuthContext::buyer(PartyId::new()));
        identity.grant(SELLER, AuthContext::seller(seller));
        identity.grant(COURIER, AuthContext::courier(PartyId::new()));

        let product = Product::new(seller, "Linen apron", Decimal::new(2000, 2));
        coordinator.catalog().register(product.clone());

        Rig {
            gateway: Gateway::new(Arc::clone(&coordinator), identity),
            coordinator,
            payments,
            product,
        }
    }

    fn create(rig: &Rig) -> CreateOrderResponse {
        rig.gateway
            .create_order(
                BUYER,
                &CreateOrderRequest {
                    product_id: rig.product.id,
                    quantity: 1,
                    fulfillment: FulfillmentKind::Delivery,
                },
            )
            .unwrap()
    }

    fn create_and_pay(rig: &Rig) -> VerifyPaymentResponse {
        let created = create(rig);
        rig.payments
            .capture("ref-1", created.order_id, created.total_amount);
        rig.gateway
            .verify_payment(&VerifyPaymentRequest {
                reference: "ref-1".into(),
            })
            .unwrap()
    }

    #[test]
    fn create_order_returns_title_and_total() {
        let rig = rig();
        let resp = create(&rig);
        assert_eq!(resp.total_amount, Decimal::new(2000, 2));
        assert_eq!(resp.product_title, "Linen apron");
    }

    #[test]
    fn unknown_product_is_404() {
        let rig = rig();
        let rejection = rig
            .gateway
            .create_order(
                BUYER,
                &CreateOrderRequest {
                    product_id: ProductId::new(),
                    quantity: 1,
                    fulfillment: FulfillmentKind::Pickup,
                },
            )
            .unwrap_err();
        assert_eq!(rejection.status, 404);
        assert_eq!(rejection.reason, "NOT_FOUND");
    }

    #[test]
    fn unresolved_session_is_403() {
        let rig = rig();
        let rejection = rig
            .gateway
            .claim_mission("session-nobody", OrderId::new())
            .unwrap_err();
        assert_eq!(rejection.status, 403);
    }

    #[test]
    fn payment_flow_returns_token() {
        let rig = rig();
        let resp = create_and_pay(&rig);
        assert_eq!(resp.escrow, EscrowStatus::Held);
        assert!(!resp.proof_token.is_empty());
    }

    #[test]
    fn claim_race_loser_gets_409() {
        let rig = rig();
        let paid = create_and_pay(&rig);

        rig.gateway.claim_mission(COURIER, paid.order_id).unwrap();

        // A second courier loses the race.
        let identity = StubIdentityResolver::new();
        identity.grant("session-c2", AuthContext::courier(PartyId::new()));
        let gateway2 = Gateway::new(Arc::clone(&rig.coordinator), Arc::new(identity));
        let rejection = gateway2
            .claim_mission("session-c2", paid.order_id)
            .unwrap_err();
        assert_eq!(rejection.status, 409);
        assert_eq!(rejection.reason, "CONFLICT");
    }

    #[test]
    fn buyer_claiming_is_403() {
        let rig = rig();
        let paid = create_and_pay(&rig);
        let rejection = rig.gateway.claim_mission(BUYER, paid.order_id).unwrap_err();
        assert_eq!(rejection.status, 403);
    }

    #[test]
    fn delivery_verify_releases() {
        let rig = rig();
        let paid = create_and_pay(&rig);

        let resp = rig
            .gateway
            .verify_delivery(
                SELLER,
                &VerifyDeliveryRequest {
                    token: paid.proof_token.clone(),
                },
            )
            .unwrap();
        assert_eq!(resp.escrow, EscrowStatus::Released);

        // A second scan is WRONG_STATE, not a generic 500.
        let rejection = rig
            .gateway
            .verify_delivery(
                SELLER,
                &VerifyDeliveryRequest {
                    token: paid.proof_token,
                },
            )
            .unwrap_err();
        assert_eq!(rejection.status, 400);
        assert_eq!(rejection.reason, "WRONG_STATE");
    }

    #[test]
    fn stale_token_is_mismatch() {
        let rig = rig();
        let paid = create_and_pay(&rig);
        let order = rig.coordinator.store().get(paid.order_id).unwrap();

        let stale = rig
            .coordinator
            .codec
            .mint(order.id, order.amount, order.seller_id, order.buyer_id)
            .unwrap();
        let rejection = rig
            .gateway
            .verify_delivery(BUYER, &VerifyDeliveryRequest { token: stale })
            .unwrap_err();
        assert_eq!(rejection.status, 400);
        assert_eq!(rejection.reason, "MISMATCH");
    }

    #[test]
    fn cancel_maps_forbidden_and_ok() {
        let rig = rig();
        let paid = create_and_pay(&rig);

        let rejection = rig
            .gateway
            .cancel_order(SELLER, paid.order_id)
            .unwrap_err();
        assert_eq!(rejection.status, 403);

        let resp = rig.gateway.cancel_order(BUYER, paid.order_id).unwrap();
        assert_eq!(resp.status, OrderStatus::Cancelled);
        assert_eq!(resp.escrow, EscrowStatus::Refunded);
    }

    #[test]
    fn rejection_serializes_for_transport() {
        let rejection = ApiRejection::from(OpenescrowError::TokenExpired);
        let json = serde_json::to_string(&rejection).unwrap();
        assert!(json.contains("EXPIRED"));
        assert!(json.contains("400"));
    }
}
