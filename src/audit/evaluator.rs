//! Guard, mutate, evaluate, record, then commit or roll back.
//!
//! [`evaluate_measure`] runs one [`Measure`] over every target it reports,
//! producing one [`MeasureResult`] per target that passes its guard and
//! installs a non-zero quantity. [`evaluate_itemized`] does the same for
//! standalone user-itemized costs, which declare their savings instead of
//! asking the oracle.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dwelling::{ComponentCode, ComponentSet, DwellingState, ItemizedCost, Trial};
use crate::economics::{
    LifecycleSavings, MeasureClass, PriorityTier, classify_priority, is_admitted,
    lifecycle_savings, savings_to_investment_ratio,
};
use crate::energy::{EnergyUse, EvaluationPass};
use crate::error::EngineError;
use crate::invariant;
use crate::measures::{CostUnit, Guard, GuardView, Measure, MeasureKind, RetrofitOption, Target};

use super::context::AuditContext;
use super::ledger::positive_part;
use super::result::{CostBreakdown, MeasureResult};

/// (kind, component) pairs admitted out of the first pass.
pub type Admissions = BTreeSet<(MeasureKind, ComponentCode)>;

/// Outcome of one target that produced a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub component: ComponentCode,
    /// Index into the results accumulator.
    pub result: usize,
    /// Meets the admission rule (mandatory tier or SIR at the minimum).
    pub admitted: bool,
}

struct Candidate {
    option: RetrofitOption,
    post_state: DwellingState,
    post: EnergyUse,
    deduction: EnergyUse,
    cost: CostBreakdown,
    lifetime_years: u32,
    savings: LifecycleSavings,
    sir: f64,
    tier: PriorityTier,
}

/// Evaluates `measure` on every target in the current pass.
///
/// With `admitted` set, targets not in the set are skipped; the cumulative
/// pass passes the first-pass admissions here. In the cumulative pass a
/// result that still meets the admission rule is committed: the post-state
/// replaces the live dwelling and the running baseline advances.
///
/// # Errors
///
/// Any invariant violation from the measure, the derived-quantity refresh,
/// the oracle, or the economics aborts the evaluation. The live dwelling is
/// left as it was before the failing trial.
pub fn evaluate_measure(
    ctx: &mut AuditContext<'_>,
    measure: &dyn Measure,
    admitted: Option<&Admissions>,
) -> Result<Vec<Evaluated>, EngineError> {
    let kind = measure.kind();
    let pass = ctx.pass;
    let mut out = Vec::new();

    for target in measure.targets(&ctx.state) {
        let code = target.component.clone();
        if !is_listed(admitted, kind, &code) {
            continue;
        }
        if kind.affects_component_leakage() {
            match ctx.components.leakage_claimant(&code) {
                Some(holder) if holder != kind => {
                    debug!(measure = %kind, component = %code, claimed_by = %holder, %pass, "component already claimed");
                    continue;
                }
                _ => {}
            }
        }
        let view = GuardView {
            state: &ctx.state,
            ledger: &ctx.components,
            pass,
        };
        if let Guard::Skip(reason) = measure.guard(&target, &view) {
            debug!(measure = %kind, component = %code, %pass, reason, "skipped");
            if ctx.state.is_required(kind) {
                ctx.results.advise(
                    format!("required-no-benefit:{kind}:{code}"),
                    format!("{kind} on {code} is required but does not apply: {reason}"),
                );
            }
            continue;
        }

        let pre = ctx.pre_energy().clone();
        let class = measure.class(&ctx.state);
        let required = ctx.state.is_required(kind);

        let credit = if pass == EvaluationPass::Cumulative && kind.affects_component_leakage() {
            Some(leakage_credit(ctx, measure, &target, &pre)?)
        } else {
            None
        };
        let audited =
            if kind == MeasureKind::InfiltrationReduction && !ctx.interactions.is_empty() {
                Some(audited_leakage_energy(ctx, &pre)?)
            } else {
                None
            };

        let mut best: Option<Candidate> = None;
        for option in measure.options(&target, &ctx.state) {
            let priced = Priced {
                pre: &pre,
                audited: audited.as_ref(),
                class,
                required,
            };
            let Some(candidate) = try_option(ctx, measure, &target, option, &priced)? else {
                continue;
            };
            debug!(
                measure = %kind,
                component = %code,
                option = %candidate.option.label,
                sir = candidate.sir,
                %pass,
                "trial"
            );
            if best.as_ref().is_none_or(|b| candidate.sir > b.sir) {
                best = Some(candidate);
            }
        }
        let Some(best) = best else {
            debug!(measure = %kind, component = %code, %pass, "no installable quantity");
            continue;
        };

        if best.post_state.derived.infiltration_floored {
            ctx.results.advise(
                "infiltration-floored",
                format!(
                    "natural infiltration floored at {:.1} cfm",
                    ctx.policy.min_natural_cfm
                ),
            );
        }

        let meets_rule = is_admitted(best.tier, best.sir, ctx.policy.minimum_sir);
        let commit = pass == EvaluationPass::Cumulative && meets_rule;

        let result = MeasureResult {
            kind,
            components: ComponentSet::single(code.clone()),
            pass,
            required,
            tier: best.tier,
            option: best.option.label.clone(),
            pre,
            post: best.post,
            interaction_deduction: best.deduction,
            cost: best.cost,
            lifetime_years: best.lifetime_years,
            annual_dollar_savings: best.savings.annual_dollars,
            present_worth_savings: best.savings.present_worth,
            sir: best.sir,
            committed: commit,
            cumulative_cost: 0.0,
            cumulative_savings_mmbtu: 0.0,
        };

        if required && result.savings_mmbtu() <= 0.0 {
            ctx.results.advise(
                format!("required-no-benefit:{kind}:{code}"),
                format!("{kind} on {code} is required but saves no energy"),
            );
        }

        if commit {
            ctx.state = best.post_state;
            ctx.advance(result.post.clone());
            ctx.components.record(kind, &code);
            if let Some(credit) = &credit {
                ctx.interactions.add(kind, &code, credit);
            }
        }

        debug!(
            measure = %kind,
            component = %code,
            sir = result.sir,
            tier = %result.tier,
            committed = commit,
            %pass,
            "recorded"
        );
        let index = ctx.results.push(result);
        out.push(Evaluated {
            component: code,
            result: index,
            admitted: meets_rule,
        });
    }
    Ok(out)
}

fn is_listed(admitted: Option<&Admissions>, kind: MeasureKind, code: &ComponentCode) -> bool {
    admitted.is_none_or(|set| set.contains(&(kind, code.clone())))
}

/// Per-target inputs shared by every option of one measure.
struct Priced<'e> {
    pre: &'e EnergyUse,
    /// Energy at the audited component leakage, for air sealing only.
    audited: Option<&'e EnergyUse>,
    class: MeasureClass,
    required: bool,
}

fn try_option(
    ctx: &mut AuditContext<'_>,
    measure: &dyn Measure,
    target: &Target,
    option: RetrofitOption,
    priced: &Priced<'_>,
) -> Result<Option<Candidate>, EngineError> {
    let Priced {
        pre,
        audited,
        class,
        required,
    } = *priced;
    let kind = measure.kind();
    let pass = ctx.pass;

    let mut trial = Trial::begin(&mut ctx.state);
    let quantity = measure.apply(target, &option, trial.state_mut())?;
    if quantity <= 0.0 {
        return Ok(None);
    }
    trial.state_mut().refresh_derived(ctx.policy.min_natural_cfm)?;
    let energy = ctx.oracle.compute_energy(trial.state(), pass)?;
    let post_state = trial.rollback();

    let post = pre.merge_end_uses(&energy, kind.end_uses());
    let credited = pre.minus(&post);
    // gross is audited-to-target; what windows and doors already claimed is withheld
    let deduction = match audited {
        Some(audited) => ctx.interactions.deduction_for(&audited.minus(&post)),
        None => EnergyUse::default(),
    };

    let (cost, lifetime_years) = price(ctx, kind, target, &option, quantity)?;
    let savings = lifecycle_savings(ctx.economics, &credited, lifetime_years)?;
    let sir = savings_to_investment_ratio(savings.present_worth, cost.total());
    let tier = classify_priority(class, required, sir, ctx.policy.minimum_sir);

    Ok(Some(Candidate {
        option,
        post_state,
        post,
        deduction,
        cost,
        lifetime_years,
        savings,
        sir,
        tier,
    }))
}

/// Savings from the leakage part of `measure` alone, measured against `pre`.
fn leakage_credit(
    ctx: &mut AuditContext<'_>,
    measure: &dyn Measure,
    target: &Target,
    pre: &EnergyUse,
) -> Result<EnergyUse, EngineError> {
    let kind = measure.kind();
    let pass = ctx.pass;
    let energy = {
        let mut side = Trial::begin(&mut ctx.state);
        measure.apply_leakage_only(target, side.state_mut())?;
        side.state_mut().refresh_derived(ctx.policy.min_natural_cfm)?;
        ctx.oracle.compute_energy(side.state(), pass)?
    };
    let leak_post = pre.merge_end_uses(&energy, kind.end_uses());
    Ok(positive_part(&pre.minus(&leak_post)))
}

/// Energy of the live dwelling with every window and door back at its
/// audited leakage, all else as in `pre`.
fn audited_leakage_energy(
    ctx: &mut AuditContext<'_>,
    pre: &EnergyUse,
) -> Result<EnergyUse, EngineError> {
    let pass = ctx.pass;
    let energy = {
        let mut side = Trial::begin(&mut ctx.state);
        side.state_mut().reset_component_leakage();
        side.state_mut().refresh_derived(ctx.policy.min_natural_cfm)?;
        ctx.oracle.compute_energy(side.state(), pass)?
    };
    Ok(pre.merge_end_uses(&energy, MeasureKind::InfiltrationReduction.end_uses()))
}

/// Cost breakdown and capped lifetime of one installation.
fn price(
    ctx: &AuditContext<'_>,
    kind: MeasureKind,
    target: &Target,
    option: &RetrofitOption,
    quantity: f64,
) -> Result<(CostBreakdown, u32), EngineError> {
    let entry = ctx.catalog.entry(kind)?;
    let ov = ctx.state.measure_override(kind);
    let material_unit = ov
        .and_then(|o| o.material_per_unit)
        .unwrap_or(entry.material_per_unit);
    let labor_unit = ov
        .and_then(|o| o.labor_per_unit)
        .unwrap_or(entry.labor_per_unit);
    let lifetime = ov
        .and_then(|o| o.lifetime_years)
        .unwrap_or(entry.lifetime_years)
        .min(ctx.policy.max_lifetime_years);
    invariant!(
        lifetime > 0,
        "{kind} lifetime must be positive after overrides"
    );

    let adders: f64 = ctx
        .state
        .itemized_costs
        .iter()
        .filter(|ic| ic.attached_to == Some(kind))
        .filter(|ic| ic.component.as_ref().is_none_or(|c| c == &target.component))
        .map(|ic| ic.cost)
        .sum();

    let cost = CostBreakdown {
        quantity,
        unit: entry.unit,
        material: quantity * material_unit * option.cost_factor,
        labor: quantity * labor_unit,
        adders,
    };
    Ok((cost, lifetime))
}

/// Evaluates every standalone itemized cost in the current pass.
///
/// Declared savings come off the pre-energy directly, floored at zero for
/// each end use and fuel; the dwelling itself never changes.
///
/// # Errors
///
/// Returns an invariant violation for negative declared savings and
/// propagates pricing errors.
pub fn evaluate_itemized(
    ctx: &mut AuditContext<'_>,
    admitted: Option<&Admissions>,
) -> Result<Vec<Evaluated>, EngineError> {
    let kind = MeasureKind::Itemized;
    let pass = ctx.pass;
    let items: Vec<ItemizedCost> = ctx
        .state
        .itemized_costs
        .iter()
        .filter(|ic| ic.attached_to.is_none())
        .cloned()
        .collect();

    let mut out = Vec::new();
    for item in items {
        let code = item.code.clone();
        if !is_listed(admitted, kind, &code) {
            continue;
        }

        let pre = ctx.pre_energy().clone();
        let mut post = pre.clone();
        if let Some(declared) = &item.savings {
            invariant!(
                declared.mmbtu >= 0.0,
                "itemized cost {code} declares negative savings {}",
                declared.mmbtu
            );
            let mix = post.end_use_mut(declared.end_use);
            let current = mix.get(declared.fuel);
            let reduced = (current - declared.mmbtu).max(0.0);
            mix.add(declared.fuel, reduced - current);
        }

        let entry = ctx.catalog.entry(kind)?;
        let lifetime_years = item
            .lifetime_years
            .or_else(|| ctx.state.measure_override(kind).and_then(|o| o.lifetime_years))
            .unwrap_or(entry.lifetime_years)
            .min(ctx.policy.max_lifetime_years);
        let cost = CostBreakdown {
            quantity: 1.0,
            unit: CostUnit::Each,
            material: item.cost,
            labor: 0.0,
            adders: 0.0,
        };

        let savings = lifecycle_savings(ctx.economics, &pre.minus(&post), lifetime_years)?;
        let sir = savings_to_investment_ratio(savings.present_worth, cost.total());
        let class = MeasureClass::Itemized {
            category: item.category,
            declares_savings: item.savings.is_some(),
        };
        let tier = classify_priority(class, false, sir, ctx.policy.minimum_sir);
        let meets_rule = is_admitted(tier, sir, ctx.policy.minimum_sir);
        let commit = pass == EvaluationPass::Cumulative && meets_rule;

        if commit {
            ctx.advance(post.clone());
            ctx.components.record(kind, &code);
        }

        debug!(measure = %kind, component = %code, sir, tier = %tier, committed = commit, %pass, "recorded");
        let index = ctx.results.push(MeasureResult {
            kind,
            components: ComponentSet::single(code.clone()),
            pass,
            required: false,
            tier,
            option: String::new(),
            pre,
            post,
            interaction_deduction: EnergyUse::default(),
            cost,
            lifetime_years,
            annual_dollar_savings: savings.annual_dollars,
            present_worth_savings: savings.present_worth,
            sir,
            committed: commit,
            cumulative_cost: 0.0,
            cumulative_savings_mmbtu: 0.0,
        });
        out.push(Evaluated {
            component: code,
            result: index,
            admitted: meets_rule,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::{AuditConfig, CatalogOverride, EconomicsConfig};
    use crate::dwelling::DwellingInput;
    use crate::economics::{EscalationTable, SIR_SENTINEL};
    use crate::energy::{DegreeDayOracle, EnergyOracle};
    use crate::measures::{Catalog, baseload, envelope, leakage, mechanical};

    struct Fixture {
        oracle: DegreeDayOracle,
        econ: EscalationTable,
        catalog: Catalog,
        policy: EconomicsConfig,
    }

    impl Fixture {
        fn new() -> Self {
            crate::logging::init_test();
            let cfg = AuditConfig::default();
            Self {
                oracle: DegreeDayOracle::new(),
                econ: EscalationTable::from_config(&cfg),
                catalog: Catalog::standard(),
                policy: cfg.economics,
            }
        }

        fn context(&self, pass: EvaluationPass) -> AuditContext<'_> {
            let mut state = DwellingState::from(DwellingInput::sample());
            state.refresh_derived(self.policy.min_natural_cfm).unwrap();
            let seasons = self.oracle.season_table(&state).unwrap();
            state.freeze_seasons(seasons);
            let base = self
                .oracle
                .compute_energy(&state, EvaluationPass::BaseCase)
                .unwrap();
            let mut ctx =
                AuditContext::new(state, &self.oracle, &self.econ, &self.catalog, &self.policy);
            ctx.set_base(base);
            ctx.begin_pass(pass);
            ctx
        }
    }

    #[test]
    fn first_pass_leaves_state_untouched() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        let before = ctx.state.clone();
        let evaluated = evaluate_measure(&mut ctx, &envelope::AtticLooseFill, None).unwrap();
        assert_eq!(evaluated.len(), 1);
        assert_eq!(ctx.state, before);
        assert!(!ctx.results.results()[0].committed);
    }

    #[test]
    fn multi_instance_measure_records_one_result_per_window_group() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        let evaluated = evaluate_measure(&mut ctx, &leakage::StormWindow, None).unwrap();
        let codes: Vec<&str> = evaluated.iter().map(|e| e.component.as_str()).collect();
        assert_eq!(codes, vec!["W1", "W2"]);
        assert_eq!(ctx.results.len(), 2);
    }

    #[test]
    fn best_attic_level_is_kept() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        evaluate_measure(&mut ctx, &envelope::AtticLooseFill, None).unwrap();
        let r = &ctx.results.results()[0];
        assert!(r.option.starts_with("R-"));
        assert!(r.sir > 0.0);
    }

    #[test]
    fn cumulative_commit_advances_baseline_and_state() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::Cumulative);
        let base = ctx.pre_energy().clone();
        evaluate_measure(&mut ctx, &baseload::LightingRetrofit, None).unwrap();
        let r = &ctx.results.results()[0];
        assert!(r.committed);
        assert_eq!(ctx.pre_energy(), &r.post);
        assert_ne!(ctx.pre_energy(), &base);
        assert!(ctx.state.lighting.retrofitted);
        assert!(
            ctx.components
                .is_committed(MeasureKind::LightingRetrofit, &"LT".into())
        );
    }

    #[test]
    fn untouched_end_uses_keep_pre_energy() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        evaluate_measure(&mut ctx, &baseload::LightingRetrofit, None).unwrap();
        let r = &ctx.results.results()[0];
        assert_eq!(r.post.heating, r.pre.heating);
        assert_eq!(r.post.cooling, r.pre.cooling);
        assert!(r.post.baseload_mmbtu() < r.pre.baseload_mmbtu());
    }

    #[test]
    fn zero_cost_gives_sentinel_sir() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "low_flow_showerhead".to_string(),
            CatalogOverride {
                material_per_unit: Some(0.0),
                labor_per_unit: Some(0.0),
                lifetime_years: None,
            },
        );
        ctx.state.measure_overrides = std::sync::Arc::new(overrides);
        evaluate_measure(&mut ctx, &baseload::LowFlowShowerhead, None).unwrap();
        assert_eq!(ctx.results.results()[0].sir, SIR_SENTINEL);
    }

    #[test]
    fn attached_itemized_cost_is_an_adder() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        evaluate_measure(&mut ctx, &envelope::AtticLooseFill, None).unwrap();
        assert_eq!(ctx.results.results()[0].cost.adders, 150.0);
    }

    #[test]
    fn leakage_claim_blocks_second_measure_on_same_window() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::Cumulative);
        ctx.components
            .record(MeasureKind::WindowReplacement, &"W1".into());
        let evaluated = evaluate_measure(&mut ctx, &leakage::StormWindow, None).unwrap();
        assert!(evaluated.iter().all(|e| e.component.as_str() != "W1"));
    }

    #[test]
    fn admission_filter_limits_targets() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::Cumulative);
        let mut admitted = Admissions::new();
        admitted.insert((MeasureKind::StormWindow, "W2".into()));
        let evaluated =
            evaluate_measure(&mut ctx, &leakage::StormWindow, Some(&admitted)).unwrap();
        assert_eq!(evaluated.len(), 1);
        assert_eq!(evaluated[0].component.as_str(), "W2");
    }

    #[test]
    fn health_and_safety_item_is_admitted_without_savings() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        let evaluated = evaluate_itemized(&mut ctx, None).unwrap();
        assert_eq!(evaluated.len(), 1);
        assert!(evaluated[0].admitted);
        let r = &ctx.results.results()[0];
        assert_eq!(r.tier, PriorityTier::HealthAndSafety);
        assert_eq!(r.post, r.pre);
    }

    #[test]
    fn required_measure_skipped_by_its_guard_is_advised() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        ctx.state.ducts_mut().outside_envelope = false;
        std::sync::Arc::make_mut(&mut ctx.state.required_measures).insert(MeasureKind::DuctSealing);

        let evaluated = evaluate_measure(&mut ctx, &mechanical::DuctSealing, None).unwrap();
        assert!(evaluated.is_empty());
        evaluate_measure(&mut ctx, &mechanical::DuctSealing, None).unwrap();

        let keys: Vec<&str> = ctx.results.advisories().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["required-no-benefit:duct_sealing:DUCT"]);
    }

    #[test]
    fn sealing_withholds_what_component_work_already_claimed() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::Cumulative);
        ctx.state.envelope_mut().windows[0].leakage_cfm50 -= 120.0;
        ctx.state.refresh_derived(fx.policy.min_natural_cfm).unwrap();
        let pre = fx
            .oracle
            .compute_energy(&ctx.state, EvaluationPass::Cumulative)
            .unwrap();
        ctx.advance(pre);
        let credit = ctx.base().minus(ctx.pre_energy());
        ctx.interactions.add(MeasureKind::StormWindow, &"W1".into(), &credit);

        evaluate_measure(&mut ctx, &leakage::InfiltrationReduction, None).unwrap();
        let r = &ctx.results.results()[0];
        assert!(r.committed);
        let withheld = r.interaction_deduction.total_mmbtu();
        assert!((withheld - credit.total_mmbtu()).abs() < 1e-9);
        assert!((ctx.state.derived.effective_cfm50 - ctx.state.air_leakage.target_cfm50).abs() < 1e-9);
        assert_eq!(ctx.pre_energy(), &r.post);
    }

    #[test]
    fn oracle_failure_restores_the_live_state() {
        let fx = Fixture::new();
        let mut ctx = fx.context(EvaluationPass::FirstPass);
        ctx.state.heating_mut().afue = 0.0;
        let before = ctx.state.clone();
        let err = evaluate_measure(&mut ctx, &leakage::InfiltrationReduction, None).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation { .. }));
        assert_eq!(ctx.state, before);
    }
}
