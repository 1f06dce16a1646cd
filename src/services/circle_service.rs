use std::collections::HashMap;
use std::sync::Arc;

use chrono::{ DateTime, Utc };
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    DatabaseConnection,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::entity::{ circle, circle_member, profile, transaction, Circle, CircleMember, Profile };
use crate::db::{ TransactionFilter, TransactionRepository };
use crate::enums::{ AccountMode, ActivityType, CircleRole, CircleVisibility };
use crate::error::{ AppError, Result };
use crate::ledger::{ self, LedgerAccount, Posting, PostingReceipt };
use crate::money;

const DEFAULT_MAX_MEMBERS: i32 = 20;
const MAX_MEMBERS_LIMIT: i32 = 100;
const INVITE_CODE_LEN: usize = 8;
const INVITE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCircleRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<CircleVisibility>,
    pub max_members: Option<i32>,
    pub target_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircleSummary {
    #[serde(flatten)]
    pub circle: circle::Model,
    pub member_count: u64,
    pub my_role: Option<CircleRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub role: CircleRole,
    pub total_contributed: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircleDetail {
    #[serde(flatten)]
    pub circle: circle::Model,
    pub my_role: Option<CircleRole>,
    /// Only shown to admins.
    pub invite_code: Option<String>,
    pub members: Vec<MemberView>,
}

pub struct CircleService {
    db: DatabaseConnection,
    transactions: Arc<TransactionRepository>,
    currency: String,
}

impl CircleService {
    pub fn new(
        db: DatabaseConnection,
        transactions: Arc<TransactionRepository>,
        currency: String
    ) -> Self {
        Self { db, transactions, currency }
    }

    /// Create a circle in `mode` with the creator as its first admin.
    pub async fn create(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        request: CreateCircleRequest
    ) -> Result<CircleDetail> {
        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > 60 {
            return Err(AppError::InvalidInput("Circle name must be 1 to 60 characters".to_string()));
        }

        let max_members = request.max_members.unwrap_or(DEFAULT_MAX_MEMBERS);
        if !(2..=MAX_MEMBERS_LIMIT).contains(&max_members) {
            return Err(
                AppError::InvalidInput(
                    format!("Member limit must be between 2 and {}", MAX_MEMBERS_LIMIT)
                )
            );
        }

        if let Some(target) = request.target_amount {
            money::ensure_positive(target)?;
        }

        let now = Utc::now();
        let circle = circle::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(
                request.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
            ),
            category: Set(
                request.category
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "savings".to_string())
            ),
            visibility: Set(
                request.visibility.unwrap_or(CircleVisibility::Private).to_string()
            ),
            max_members: Set(max_members),
            target_amount: Set(request.target_amount),
            balance: Set(0),
            mode: Set(mode.to_string()),
            invite_code: Set(generate_invite_code()),
            created_by: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let txn = self.db.begin().await?;
        let circle = circle.insert(&txn).await?;
        insert_member(&txn, circle.id, user_id, CircleRole::Admin).await?;
        txn.commit().await?;

        tracing::info!("User {} created circle {} ({})", user_id, circle.id, mode);
        self.detail(user_id, mode, circle.id).await
    }

    pub async fn list_mine(&self, user_id: Uuid, mode: AccountMode) -> Result<Vec<CircleSummary>> {
        let memberships = CircleMember::find()
            .filter(circle_member::Column::UserId.eq(user_id))
            .all(&self.db).await?;

        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let roles: HashMap<Uuid, String> = memberships
            .into_iter()
            .map(|m| (m.circle_id, m.role))
            .collect();

        let circles = Circle::find()
            .filter(circle::Column::Id.is_in(roles.keys().copied().collect::<Vec<_>>()))
            .filter(circle::Column::Mode.eq(mode.as_str()))
            .order_by_desc(circle::Column::CreatedAt)
            .all(&self.db).await?;

        let counts = self.member_counts(&circles).await?;

        circles
            .into_iter()
            .map(|circle| -> Result<CircleSummary> {
                let my_role = roles
                    .get(&circle.id)
                    .map(|r| r.parse())
                    .transpose()?;
                Ok(CircleSummary {
                    member_count: counts.get(&circle.id).copied().unwrap_or(0),
                    my_role,
                    circle,
                })
            })
            .collect()
    }

    /// Public circles of this mode the user has not joined yet.
    pub async fn discover(&self, user_id: Uuid, mode: AccountMode) -> Result<Vec<CircleSummary>> {
        let joined: Vec<Uuid> = CircleMember::find()
            .filter(circle_member::Column::UserId.eq(user_id))
            .all(&self.db).await?
            .into_iter()
            .map(|m| m.circle_id)
            .collect();

        let mut query = Circle::find()
            .filter(circle::Column::Mode.eq(mode.as_str()))
            .filter(circle::Column::Visibility.eq(CircleVisibility::Public.as_str()));

        if !joined.is_empty() {
            query = query.filter(circle::Column::Id.is_not_in(joined));
        }

        let circles = query.order_by_desc(circle::Column::CreatedAt).all(&self.db).await?;
        let counts = self.member_counts(&circles).await?;

        Ok(
            circles
                .into_iter()
                .map(|circle| CircleSummary {
                    member_count: counts.get(&circle.id).copied().unwrap_or(0),
                    my_role: None,
                    circle,
                })
                .collect()
        )
    }

    /// Members see everything; outsiders only see public circles.
    pub async fn detail(&self, user_id: Uuid, mode: AccountMode, id: Uuid) -> Result<CircleDetail> {
        let circle = ledger::find_circle(&self.db, mode, id).await?;
        let members = CircleMember::find()
            .filter(circle_member::Column::CircleId.eq(id))
            .order_by_asc(circle_member::Column::JoinedAt)
            .all(&self.db).await?;

        let my_role = members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role.parse::<CircleRole>())
            .transpose()?;

        if my_role.is_none() && circle.visibility != CircleVisibility::Public.as_str() {
            return Err(AppError::NotFound("Circle not found".to_string()));
        }

        let names: HashMap<Uuid, Option<String>> = Profile::find()
            .filter(profile::Column::Id.is_in(members.iter().map(|m| m.user_id).collect::<Vec<_>>()))
            .all(&self.db).await?
            .into_iter()
            .map(|p| (p.id, p.full_name))
            .collect();

        let members = members
            .into_iter()
            .map(|m| -> Result<MemberView> {
                Ok(MemberView {
                    display_name: names.get(&m.user_id).cloned().flatten(),
                    role: m.role.parse()?,
                    user_id: m.user_id,
                    total_contributed: m.total_contributed,
                    joined_at: m.joined_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let invite_code = match my_role {
            Some(CircleRole::Admin) => Some(circle.invite_code.clone()),
            _ => None,
        };

        Ok(CircleDetail { circle, my_role, invite_code, members })
    }

    /// Join a public circle, or a private one with its invite code.
    pub async fn join(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        invite_code: Option<&str>
    ) -> Result<CircleDetail> {
        let txn = self.db.begin().await?;
        let circle = ledger::find_circle(&txn, mode, id).await?;

        if find_membership(&txn, id, user_id).await?.is_some() {
            return Err(AppError::Conflict("Already a member of this circle".to_string()));
        }

        let code_matches = invite_code
            .map(|code| code.trim().eq_ignore_ascii_case(&circle.invite_code))
            .unwrap_or(false);
        if circle.visibility != CircleVisibility::Public.as_str() && !code_matches {
            return Err(AppError::Forbidden("A valid invite code is required".to_string()));
        }

        let member_count = CircleMember::find()
            .filter(circle_member::Column::CircleId.eq(id))
            .count(&txn).await?;
        if member_count >= (circle.max_members.max(0) as u64) {
            return Err(AppError::Conflict("Circle is full".to_string()));
        }

        insert_member(&txn, id, user_id, CircleRole::Member).await?;
        txn.commit().await?;

        tracing::info!("User {} joined circle {}", user_id, id);
        self.detail(user_id, mode, id).await
    }

    /// Leave a circle. The last admin must hand over first, and the last member
    /// can only leave an empty circle, which is then removed.
    pub async fn leave(&self, user_id: Uuid, mode: AccountMode, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        let circle = ledger::find_circle(&txn, mode, id).await?;
        let membership = find_membership(&txn, id, user_id).await?.ok_or_else(||
            AppError::NotFound("Not a member of this circle".to_string())
        )?;

        let members = CircleMember::find()
            .filter(circle_member::Column::CircleId.eq(id))
            .all(&txn).await?;
        let admins = members
            .iter()
            .filter(|m| m.role == CircleRole::Admin.as_str())
            .count();

        if members.len() == 1 {
            if circle.balance > 0 {
                return Err(
                    AppError::Conflict(
                        format!(
                            "Withdraw the remaining {} before leaving",
                            money::format_naira(circle.balance)
                        )
                    )
                );
            }
            CircleMember::delete_by_id(membership.id).exec(&txn).await?;
            Circle::delete_by_id(id).exec(&txn).await?;
            txn.commit().await?;

            tracing::info!("Circle {} removed after its last member left", id);
            return Ok(());
        }

        if membership.role == CircleRole::Admin.as_str() && admins == 1 {
            return Err(
                AppError::Conflict("Promote another admin before leaving the circle".to_string())
            );
        }

        CircleMember::delete_by_id(membership.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("User {} left circle {}", user_id, id);
        Ok(())
    }

    pub async fn change_role(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        member_id: Uuid,
        role: CircleRole
    ) -> Result<MemberView> {
        let txn = self.db.begin().await?;
        ledger::find_circle(&txn, mode, id).await?;
        require_role(&txn, id, user_id, CircleRole::Admin).await?;

        let target = find_membership(&txn, id, member_id).await?.ok_or_else(||
            AppError::NotFound("Member not found".to_string())
        )?;

        if target.role == CircleRole::Admin.as_str() && role != CircleRole::Admin {
            let admins = CircleMember::find()
                .filter(circle_member::Column::CircleId.eq(id))
                .filter(circle_member::Column::Role.eq(CircleRole::Admin.as_str()))
                .count(&txn).await?;
            if admins <= 1 {
                return Err(AppError::Conflict("A circle needs at least one admin".to_string()));
            }
        }

        let mut active: circle_member::ActiveModel = target.into();
        active.role = Set(role.to_string());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(MemberView {
            user_id: updated.user_id,
            display_name: None,
            role,
            total_contributed: updated.total_contributed,
            joined_at: updated.joined_at,
        })
    }

    /// Move money from the member's main wallet into the circle pot.
    pub async fn contribute(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        amount: i64,
        idempotency_key: Option<String>
    ) -> Result<PostingReceipt> {
        let txn = self.db.begin().await?;
        let circle = ledger::find_circle(&txn, mode, id).await?;
        let membership = find_membership(&txn, id, user_id).await?.ok_or_else(||
            AppError::Forbidden("Only members can contribute to a circle".to_string())
        )?;

        let posting = Posting::new(
            user_id,
            mode,
            LedgerAccount::Main,
            LedgerAccount::Circle { id },
            amount,
            ActivityType::CircleContribution
        )
            .describe(format!("Contribution to {}", circle.name))
            .idempotency_key(idempotency_key);

        let receipt = ledger::post(&txn, posting, &self.currency).await?;

        if !receipt.replayed {
            CircleMember::update_many()
                .col_expr(
                    circle_member::Column::TotalContributed,
                    Expr::col(circle_member::Column::TotalContributed).add(amount)
                )
                .filter(circle_member::Column::Id.eq(membership.id))
                .exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(receipt)
    }

    /// Pay out of the circle pot into the admin's main wallet.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        amount: i64,
        idempotency_key: Option<String>
    ) -> Result<PostingReceipt> {
        let txn = self.db.begin().await?;
        let circle = ledger::find_circle(&txn, mode, id).await?;
        require_role(&txn, id, user_id, CircleRole::Admin).await?;

        let posting = Posting::new(
            user_id,
            mode,
            LedgerAccount::Circle { id },
            LedgerAccount::Main,
            amount,
            ActivityType::CircleWithdrawal
        )
            .describe(format!("Withdrawal from {}", circle.name))
            .idempotency_key(idempotency_key);

        let receipt = ledger::post(&txn, posting, &self.currency).await?;
        txn.commit().await?;

        Ok(receipt)
    }

    pub async fn transactions(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        filter: TransactionFilter
    ) -> Result<Vec<transaction::Model>> {
        ledger::find_circle(&self.db, mode, id).await?;
        if find_membership(&self.db, id, user_id).await?.is_none() {
            return Err(AppError::Forbidden("Only members can view circle activity".to_string()));
        }

        self.transactions.find_by_circle(id, filter).await
    }

    async fn member_counts(&self, circles: &[circle::Model]) -> Result<HashMap<Uuid, u64>> {
        if circles.is_empty() {
            return Ok(HashMap::new());
        }

        let mut counts = HashMap::new();
        for member in CircleMember::find()
            .filter(circle_member::Column::CircleId.is_in(circles.iter().map(|c| c.id).collect::<Vec<_>>()))
            .all(&self.db).await? {
            *counts.entry(member.circle_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

async fn find_membership<C>(conn: &C, circle_id: Uuid, user_id: Uuid) -> Result<Option<circle_member::Model>>
    where C: ConnectionTrait
{
    let membership = CircleMember::find()
        .filter(circle_member::Column::CircleId.eq(circle_id))
        .filter(circle_member::Column::UserId.eq(user_id))
        .one(conn).await?;
    Ok(membership)
}

async fn require_role<C>(conn: &C, circle_id: Uuid, user_id: Uuid, role: CircleRole) -> Result<()>
    where C: ConnectionTrait
{
    match find_membership(conn, circle_id, user_id).await? {
        Some(member) if member.role == role.as_str() => Ok(()),
        _ => Err(AppError::Forbidden(format!("Only a circle {} can do this", role))),
    }
}

async fn insert_member<C>(conn: &C, circle_id: Uuid, user_id: Uuid, role: CircleRole) -> Result<()>
    where C: ConnectionTrait
{
    let member = circle_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        circle_id: Set(circle_id),
        user_id: Set(user_id),
        role: Set(role.to_string()),
        total_contributed: Set(0),
        joined_at: Set(Utc::now()),
    };
    member.insert(conn).await?;
    Ok(())
}

fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CHARSET[rng.random_range(0..INVITE_CHARSET.len())] as char)
        .collect()
}
