use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// # Summary
/// 下游交易账户 ID。
///
/// # Invariants
/// - 对本系统不透明，仅作为缓存键与查询参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 追踪最大回撤的结算模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TrailingDrawdownMode {
    /// 日终结算
    #[serde(rename = "EOD")]
    Eod,
    /// 实时追踪
    RealTime,
}

/// # Summary
/// 账户的自动强平风控参数 (合并视图)。
///
/// # Invariants
/// - 所有字段均可缺省，缺省字段不参与序列化。
/// - 由 "所有者" 与 "授权方" 两个来源合并而成，冲突时所有者的值优先。
/// - 只有携带 `id` 的记录才被视为可识别的有效记录。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_auto_liq: Option<Decimal>,
    /// 日亏损强平阈值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_loss_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flatten_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown_limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown_mode: Option<TrailingDrawdownMode>,
    /// 日盈利目标 (达到后强平)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_profit_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_profit_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_unlock: Option<bool>,
}

impl RiskSettings {
    /// 记录是否可识别 (携带账户 ID)。
    pub fn is_identifiable(&self) -> bool {
        self.id.is_some()
    }

    /// # Summary
    /// 以 `self` 为底，用 `owner` 的字段覆盖。
    ///
    /// # Logic
    /// 逐字段取 `owner` 的值，`owner` 缺省时回退到 `self`。
    ///
    /// # Arguments
    /// * `owner`: 所有者来源的记录，冲突时优先。
    ///
    /// # Returns
    /// 合并后的新记录。
    pub fn overlaid_by(self, owner: RiskSettings) -> RiskSettings {
        RiskSettings {
            id: owner.id.or(self.id),
            changes_locked: owner.changes_locked.or(self.changes_locked),
            margin_percentage_alert: owner.margin_percentage_alert.or(self.margin_percentage_alert),
            daily_loss_percentage_alert: owner
                .daily_loss_percentage_alert
                .or(self.daily_loss_percentage_alert),
            daily_loss_alert: owner.daily_loss_alert.or(self.daily_loss_alert),
            margin_percentage_liq: owner.margin_percentage_liq.or(self.margin_percentage_liq),
            daily_loss_percentage_liq: owner
                .daily_loss_percentage_liq
                .or(self.daily_loss_percentage_liq),
            daily_loss_liq: owner.daily_loss_liq.or(self.daily_loss_liq),
            margin_percentage_auto_liq: owner
                .margin_percentage_auto_liq
                .or(self.margin_percentage_auto_liq),
            daily_loss_percentage_auto_liq: owner
                .daily_loss_percentage_auto_liq
                .or(self.daily_loss_percentage_auto_liq),
            daily_loss_auto_liq: owner.daily_loss_auto_liq.or(self.daily_loss_auto_liq),
            weekly_loss_auto_liq: owner.weekly_loss_auto_liq.or(self.weekly_loss_auto_liq),
            flatten_timestamp: owner.flatten_timestamp.or(self.flatten_timestamp),
            trailing_max_drawdown: owner.trailing_max_drawdown.or(self.trailing_max_drawdown),
            trailing_max_drawdown_limit: owner
                .trailing_max_drawdown_limit
                .or(self.trailing_max_drawdown_limit),
            trailing_max_drawdown_mode: owner
                .trailing_max_drawdown_mode
                .or(self.trailing_max_drawdown_mode),
            daily_profit_auto_liq: owner.daily_profit_auto_liq.or(self.daily_profit_auto_liq),
            weekly_profit_auto_liq: owner.weekly_profit_auto_liq.or(self.weekly_profit_auto_liq),
            do_not_unlock: owner.do_not_unlock.or(self.do_not_unlock),
        }
    }

    /// # Summary
    /// 合并所有者与授权方两个来源。
    ///
    /// # Logic
    /// 1. 丢弃不可识别 (无 `id`) 的记录。
    /// 2. 两侧都存在时，授权方为底、所有者覆盖。
    /// 3. 仅一侧存在时原样返回该侧。
    ///
    /// # Returns
    /// 两侧都不可识别时返回 `None`。
    pub fn merge(
        owner: Option<RiskSettings>,
        permissioned: Option<RiskSettings>,
    ) -> Option<RiskSettings> {
        let owner = owner.filter(RiskSettings::is_identifiable);
        let permissioned = permissioned.filter(RiskSettings::is_identifiable);
        match (owner, permissioned) {
            (Some(o), Some(p)) => Some(p.overlaid_by(o)),
            (Some(o), None) => Some(o),
            (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }
}

/// # Summary
/// 允许写入的风控字段白名单。
///
/// # Invariants
/// - 只包含亏损、盈利、预警、保证金与回撤相关字段；未知键在反序列化时被丢弃。
/// - `id`、`changesLocked`、`doNotUnlock` 等管理字段不可经由本接口写入。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettingsUpdate {
    /// 日亏损强平阈值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 500)]
    pub daily_loss_auto_liq: Option<Decimal>,
    /// 日盈利目标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 1000)]
    pub daily_profit_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_loss_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_profit_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_alert: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_loss_percentage_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage_auto_liq: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown_limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_max_drawdown_mode: Option<TrailingDrawdownMode>,
}

impl RiskSettingsUpdate {
    /// 白名单内没有任何字段被设置。
    pub fn is_empty(&self) -> bool {
        *self == RiskSettingsUpdate::default()
    }

    /// # Summary
    /// 将本次写入应用到一条已有记录上，返回写入后的视图。
    ///
    /// # Logic
    /// 已设置的字段覆盖 `base`，未设置的字段保留原值。
    pub fn apply_to(&self, base: RiskSettings) -> RiskSettings {
        RiskSettings {
            daily_loss_auto_liq: self.daily_loss_auto_liq.or(base.daily_loss_auto_liq),
            daily_profit_auto_liq: self.daily_profit_auto_liq.or(base.daily_profit_auto_liq),
            weekly_loss_auto_liq: self.weekly_loss_auto_liq.or(base.weekly_loss_auto_liq),
            weekly_profit_auto_liq: self.weekly_profit_auto_liq.or(base.weekly_profit_auto_liq),
            daily_loss_alert: self.daily_loss_alert.or(base.daily_loss_alert),
            daily_loss_percentage_alert: self
                .daily_loss_percentage_alert
                .or(base.daily_loss_percentage_alert),
            margin_percentage_alert: self.margin_percentage_alert.or(base.margin_percentage_alert),
            daily_loss_liq: self.daily_loss_liq.or(base.daily_loss_liq),
            daily_loss_percentage_liq: self
                .daily_loss_percentage_liq
                .or(base.daily_loss_percentage_liq),
            margin_percentage_liq: self.margin_percentage_liq.or(base.margin_percentage_liq),
            daily_loss_percentage_auto_liq: self
                .daily_loss_percentage_auto_liq
                .or(base.daily_loss_percentage_auto_liq),
            margin_percentage_auto_liq: self
                .margin_percentage_auto_liq
                .or(base.margin_percentage_auto_liq),
            trailing_max_drawdown: self.trailing_max_drawdown.or(base.trailing_max_drawdown),
            trailing_max_drawdown_limit: self
                .trailing_max_drawdown_limit
                .or(base.trailing_max_drawdown_limit),
            trailing_max_drawdown_mode: self
                .trailing_max_drawdown_mode
                .or(base.trailing_max_drawdown_mode),
            ..base
        }
    }
}

/// # Summary
/// 下游写入接口的原始回包。
///
/// # Invariants
/// - 根据调用者角色，记录可能出现在所有者形态或授权方形态之一。
/// - `error_text` 非空代表下游拒绝了本次写入。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_account_auto_liq: Option<RiskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissioned_account_auto_liq: Option<RiskSettings>,
}

/// 下游可见的交易账户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[schema(example = "DEMO123456")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// 读取风控参数的结果，附带是否命中缓存。
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsLookup {
    pub settings: Option<RiskSettings>,
    pub cached: bool,
}
