// src/services/representation_service.rs
//
// Registro das representações Vendedor x Empresa e do fluxo de
// solicitação/aprovação. A checagem de papel (ADMIN etc.) é
// responsabilidade do handler; aqui só mora a regra de negócio.

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::store::{CatalogStore, RepresentationStore},
    models::representation::{
        Representation, RepresentationRequest, RequestDecision, RequestOutcome, RequestStatus,
    },
};

#[derive(Clone)]
pub struct RepresentationService {
    repo: Arc<dyn RepresentationStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl RepresentationService {
    pub fn new(
        repo: Arc<dyn RepresentationStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, catalog, clock }
    }

    /// Vendedor pede para representar uma empresa.
    ///
    /// Primeira solicitação passa pela aprovação do administrador; se já
    /// existe um vínculo inativo para o par, ele é reativado direto, sem
    /// nova aprovação (re-solicitar não tem atrito).
    pub async fn request_representation(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
        message: Option<String>,
    ) -> Result<RequestOutcome, AppError> {
        self.catalog
            .find_seller(seller_id)
            .await?
            .ok_or(AppError::NotFound("Vendedor"))?;
        self.catalog
            .find_company(company_id)
            .await?
            .ok_or(AppError::NotFound("Empresa"))?;

        if let Some(representation) = self.repo.find_by_pair(seller_id, company_id).await? {
            if representation.active {
                return Err(AppError::UniqueConstraintViolation(
                    "O vendedor já representa esta empresa.".to_string(),
                ));
            }

            // Caminho rápido: reativa a linha existente
            let now = self.clock.now();
            self.repo
                .set_representation_active(representation.id, true, now)
                .await?;
            tracing::info!(
                "Representação {} reativada para o vendedor {}",
                representation.id,
                seller_id
            );
            return Ok(RequestOutcome::Reactivated(Representation {
                active: true,
                updated_at: now,
                ..representation
            }));
        }

        if self
            .repo
            .find_pending_request(seller_id, company_id)
            .await?
            .is_some()
        {
            return Err(AppError::UniqueConstraintViolation(
                "Já existe uma solicitação pendente para esta empresa.".to_string(),
            ));
        }

        let request = RepresentationRequest {
            id: Uuid::new_v4(),
            seller_id,
            company_id,
            message,
            status: RequestStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            created_at: self.clock.now(),
        };
        self.repo.insert_request(&request).await?;

        Ok(RequestOutcome::Submitted(request))
    }

    /// Resolve uma solicitação pendente. APROVAR grava o vínculo e a
    /// resolução num único commit; resolver de novo falha em vez de
    /// silenciosamente não fazer nada.
    pub async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: RequestDecision,
        admin_id: Uuid,
    ) -> Result<RepresentationRequest, AppError> {
        let request = self
            .repo
            .find_request(request_id)
            .await?
            .ok_or(AppError::NotFound("Solicitação de representação"))?;

        if request.status.is_terminal() {
            return Err(AppError::InvalidState(
                "Esta solicitação já foi resolvida.".to_string(),
            ));
        }

        let now = self.clock.now();
        let resolved = RepresentationRequest {
            status: match decision {
                RequestDecision::Approve => RequestStatus::Approved,
                RequestDecision::Reject => RequestStatus::Rejected,
            },
            resolved_by: Some(admin_id),
            resolved_at: Some(now),
            ..request
        };

        match decision {
            RequestDecision::Approve => {
                // Reaproveita a linha do par se ela existir (inativa);
                // a comissão fica nos padrões do perfil do vendedor.
                let existing = self
                    .repo
                    .find_by_pair(resolved.seller_id, resolved.company_id)
                    .await?;
                let representation = match existing {
                    Some(row) => Representation {
                        active: true,
                        updated_at: now,
                        ..row
                    },
                    None => Representation {
                        id: Uuid::new_v4(),
                        seller_id: resolved.seller_id,
                        company_id: resolved.company_id,
                        active: true,
                        commission_override: None,
                        target_override: None,
                        created_at: now,
                        updated_at: now,
                    },
                };

                self.repo.commit_approval(&resolved, &representation).await?;
                tracing::info!(
                    "Solicitação {} aprovada; vendedor {} representa a empresa {}",
                    resolved.id,
                    resolved.seller_id,
                    resolved.company_id
                );
            }
            RequestDecision::Reject => {
                self.repo.update_request(&resolved).await?;
            }
        }

        Ok(resolved)
    }

    pub async fn is_representing(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, AppError> {
        let representation = self.repo.find_by_pair(seller_id, company_id).await?;
        Ok(representation.is_some_and(|r| r.active))
    }

    /// Empresas visíveis para o vendedor (escopo de produtos e orçamentos).
    pub async fn companies_for(&self, seller_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.repo.active_company_ids(seller_id).await
    }

    pub async fn list_pending_requests(&self) -> Result<Vec<RepresentationRequest>, AppError> {
        self.repo.list_pending_requests().await
    }

    /// Liga/desliga um vínculo direto, fora do fluxo de solicitação.
    pub async fn toggle_active(
        &self,
        representation_id: Uuid,
        active: bool,
    ) -> Result<Representation, AppError> {
        let updated = self
            .repo
            .set_representation_active(representation_id, active, self.clock.now())
            .await?;
        if !updated {
            return Err(AppError::NotFound("Representação"));
        }

        self.repo
            .find_representation(representation_id)
            .await?
            .ok_or(AppError::NotFound("Representação"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::test_support::FixedClock;
    use crate::db::memory::{InMemoryCatalogRepository, InMemoryRepresentationRepository};
    use crate::models::company::{Company, Seller};
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    struct Fixture {
        service: RepresentationService,
        repo: Arc<InMemoryRepresentationRepository>,
        seller_id: Uuid,
        company_id: Uuid,
        admin_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::at(
            DateTime::parse_from_rfc3339("2025-09-17T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let repo = Arc::new(InMemoryRepresentationRepository::new());
        let catalog = Arc::new(InMemoryCatalogRepository::new());

        let now = clock.now();
        let seller = Seller {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Vendedor Teste".to_string(),
            default_commission: Decimal::new(500, 2),
            default_target: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let company = Company {
            id: Uuid::new_v4(),
            legal_name: "Empresa Teste".to_string(),
            tax_id: "12.345.678/0001-99".to_string(),
            address: None,
            bank_info: None,
            brand_color: None,
            base_currency: "BRL".to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        catalog.insert_seller(&seller).await.unwrap();
        catalog.insert_company(&company).await.unwrap();

        Fixture {
            service: RepresentationService::new(repo.clone(), catalog, clock),
            repo,
            seller_id: seller.id,
            company_id: company.id,
            admin_id: Uuid::new_v4(),
        }
    }

    fn submitted_id(outcome: &RequestOutcome) -> Uuid {
        match outcome {
            RequestOutcome::Submitted(request) => request.id,
            RequestOutcome::Reactivated(_) => panic!("esperava solicitação pendente"),
        }
    }

    #[tokio::test]
    async fn request_then_approve_grants_representation() {
        let f = fixture().await;

        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, Some("oi".to_string()))
            .await
            .unwrap();
        let request_id = submitted_id(&outcome);

        assert!(!f.service.is_representing(f.seller_id, f.company_id).await.unwrap());

        let resolved = f
            .service
            .resolve_request(request_id, RequestDecision::Approve, f.admin_id)
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Approved);
        assert_eq!(resolved.resolved_by, Some(f.admin_id));
        assert!(resolved.resolved_at.is_some());

        assert!(f.service.is_representing(f.seller_id, f.company_id).await.unwrap());
        assert_eq!(
            f.service.companies_for(f.seller_id).await.unwrap(),
            vec![f.company_id]
        );
    }

    #[tokio::test]
    async fn duplicate_request_after_approval_is_rejected() {
        let f = fixture().await;

        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();
        f.service
            .resolve_request(submitted_id(&outcome), RequestDecision::Approve, f.admin_id)
            .await
            .unwrap();

        let err = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn pending_request_blocks_a_second_one() {
        let f = fixture().await;

        f.service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();

        let err = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn resolving_twice_fails_and_keeps_representation() {
        let f = fixture().await;

        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();
        let request_id = submitted_id(&outcome);
        f.service
            .resolve_request(request_id, RequestDecision::Approve, f.admin_id)
            .await
            .unwrap();

        let before = f
            .repo
            .find_by_pair(f.seller_id, f.company_id)
            .await
            .unwrap()
            .unwrap();

        let err = f
            .service
            .resolve_request(request_id, RequestDecision::Reject, f.admin_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // O vínculo não muda com a segunda tentativa
        let after = f
            .repo
            .find_by_pair(f.seller_id, f.company_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.id, before.id);
        assert!(after.active);
    }

    #[tokio::test]
    async fn reject_only_updates_the_request() {
        let f = fixture().await;

        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();
        let resolved = f
            .service
            .resolve_request(submitted_id(&outcome), RequestDecision::Reject, f.admin_id)
            .await
            .unwrap();

        assert_eq!(resolved.status, RequestStatus::Rejected);
        assert!(!f.service.is_representing(f.seller_id, f.company_id).await.unwrap());
    }

    #[tokio::test]
    async fn inactive_representation_is_reactivated_without_approval() {
        let f = fixture().await;

        // Aprova e depois desativa
        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();
        f.service
            .resolve_request(submitted_id(&outcome), RequestDecision::Approve, f.admin_id)
            .await
            .unwrap();
        let representation = f
            .repo
            .find_by_pair(f.seller_id, f.company_id)
            .await
            .unwrap()
            .unwrap();
        f.service
            .toggle_active(representation.id, false)
            .await
            .unwrap();
        assert!(!f.service.is_representing(f.seller_id, f.company_id).await.unwrap());

        // Re-solicitar reativa a mesma linha, sem passar pela aprovação
        let outcome = f
            .service
            .request_representation(f.seller_id, f.company_id, None)
            .await
            .unwrap();
        match outcome {
            RequestOutcome::Reactivated(reactivated) => {
                assert_eq!(reactivated.id, representation.id);
                assert!(reactivated.active);
            }
            RequestOutcome::Submitted(_) => panic!("esperava reativação direta"),
        }
        assert!(f.service.is_representing(f.seller_id, f.company_id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_ids_fail_with_not_found() {
        let f = fixture().await;

        let err = f
            .service
            .request_representation(Uuid::new_v4(), f.company_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = f
            .service
            .resolve_request(Uuid::new_v4(), RequestDecision::Approve, f.admin_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = f.service.toggle_active(Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
