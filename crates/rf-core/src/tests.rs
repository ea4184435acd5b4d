//! Unit tests for rf-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EntityId, ResourceType};

    #[test]
    fn allocation_is_monotonic() {
        let a = ResourceType::allocate();
        let b = ResourceType::allocate();
        assert!(b > a);
        let e0 = EntityId::allocate();
        let e1 = EntityId::allocate();
        assert!(e1 > e0);
    }

    #[test]
    fn display() {
        assert_eq!(ResourceType(7).to_string(), "ResourceType(7)");
        assert_eq!(EntityId(3).to_string(), "EntityId(3)");
    }
}

#[cfg(test)]
mod countable {
    use std::cmp::Ordering;

    use crate::{CountableResource, FlowError, MAX_AMOUNT};

    #[test]
    fn typical_mints_new_type() {
        let a = CountableResource::typical("wood");
        let b = CountableResource::typical("wood");
        assert!(!a.is_same_type(&b), "names are cosmetic; types must differ");
        assert_eq!(a.amount(), 0.0);
    }

    #[test]
    fn derived_resources_share_type() {
        let wood = CountableResource::new("wood", 10.0).unwrap();
        let copy = wood.duplicate();
        let zero = wood.duplicate0();
        let other = wood.with_amount(4.0).unwrap();
        assert!(wood.is_same_type(&copy));
        assert!(wood.is_same_type(&zero));
        assert!(wood.is_same_type(&other));
        assert_eq!(copy.amount(), 10.0);
        assert_eq!(zero.amount(), 0.0);
    }

    #[test]
    fn invalid_amounts_are_rejected() {
        assert_eq!(
            CountableResource::new("x", -1.0).unwrap_err(),
            FlowError::InvalidAmount(-1.0)
        );
        assert_eq!(
            CountableResource::new("x", 1.5).unwrap_err(),
            FlowError::NonIntegerAmount(1.5)
        );
        assert!(CountableResource::new("x", f64::NAN).is_err());
        assert!(CountableResource::new("x", MAX_AMOUNT * 2.0).is_err());
        assert!(CountableResource::new("x", MAX_AMOUNT).is_ok());
    }

    #[test]
    fn increase_and_decrease_signal_instead_of_failing() {
        let mut r = CountableResource::new("x", 5.0).unwrap();
        assert!(r.increase(3.0));
        assert_eq!(r.amount(), 8.0);
        assert!(!r.decrease(9.0), "would go negative");
        assert_eq!(r.amount(), 8.0);
        assert!(!r.increase(0.5), "non-integer step");
        assert_eq!(r.amount(), 8.0);
        assert!(r.decrement());
        assert!(r.increment());
        assert_eq!(r.amount(), 8.0);
    }

    #[test]
    fn add_requires_same_type() {
        let mut a = CountableResource::new("a", 2.0).unwrap();
        let mut b = CountableResource::new("b", 3.0).unwrap();
        assert!(matches!(a.add(&mut b), Err(FlowError::UnequalType { .. })));
        assert_eq!(a.amount(), 2.0);
        assert_eq!(b.amount(), 3.0);

        let mut a2 = a.with_amount(3.0).unwrap();
        a.add(&mut a2).unwrap();
        assert_eq!(a.amount(), 5.0);
        assert_eq!(a2.amount(), 0.0);
    }

    #[test]
    fn add_at_most_moves_partial() {
        let mut a = CountableResource::new("a", 0.0).unwrap();
        let mut b = a.with_amount(10.0).unwrap();
        let moved = a.add_at_most(&mut b, 4.0).unwrap();
        assert_eq!(moved, 4.0);
        assert_eq!(a.amount(), 4.0);
        assert_eq!(b.amount(), 6.0);
    }

    #[test]
    fn reduce_carves_range() {
        let mut r = CountableResource::new("x", 10.0).unwrap();
        let part = r.reduce(2.0, 4.0).unwrap().unwrap();
        assert_eq!(part.amount(), 4.0);
        assert_eq!(r.amount(), 6.0);
        assert!(part.is_same_type(&r));

        let rest = r.reduce(0.0, f64::INFINITY).unwrap().unwrap();
        assert_eq!(rest.amount(), 6.0);
        assert!(r.is_zero());
    }

    #[test]
    fn reduce_returns_none_when_at_least_unmet() {
        let mut r = CountableResource::new("x", 3.0).unwrap();
        assert!(r.reduce(4.0, 8.0).unwrap().is_none());
        assert_eq!(r.amount(), 3.0);
    }

    #[test]
    fn divide_is_exact() {
        let mut r = CountableResource::new("x", 3.0).unwrap();
        assert_eq!(r.divide(2.0).unwrap().unwrap().amount(), 2.0);
        assert!(r.divide(2.0).unwrap().is_none());
        assert_eq!(r.amount(), 1.0);
    }

    #[test]
    fn bounds_and_compare() {
        let mut r = CountableResource::new("x", 10.0).unwrap();
        r.bound(7.0);
        assert_eq!(r.amount(), 7.0);
        r.bound_range(8.0, 9.0);
        assert_eq!(r.amount(), 8.0);

        let smaller = r.with_amount(2.0).unwrap();
        assert_eq!(r.compare(&smaller).unwrap(), Ordering::Greater);
        let alien = CountableResource::typical("y");
        assert!(r.compare(&alien).is_err());
    }
}

#[cfg(test)]
mod entity {
    use crate::{CountableResource, Entity, FlowError, Resource};

    #[test]
    fn duplicates_keep_type_but_not_identity() {
        let e = Entity::typical("truck");
        let d = e.duplicate();
        assert!(e.is_same_type(&d));
        assert_ne!(e.id(), d.id());
        assert_eq!(Resource::from(d).amount(), 1.0);
    }

    #[test]
    fn compose_and_decompose() {
        let mut box_ = Entity::typical("crate").duplicate0();
        assert!(!box_.is_composite());
        let part: Resource = CountableResource::new("bolt", 3.0).unwrap().into();
        box_.compose(vec![part.clone()]);
        assert!(box_.is_composite());
        assert_eq!(box_.storage().unwrap(), &[part]);
        let parts = box_.decompose().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(box_.decompose(), Err(FlowError::NotComposite(_))));
    }

    #[test]
    fn duplicate0_drops_payload() {
        let mut e = Entity::typical("crate");
        e.compose(vec![]);
        assert!(e.duplicate().is_composite());
        assert!(!e.duplicate0().is_composite());
    }
}

#[cfg(test)]
mod resource {
    use crate::{CountableResource, Entity, FlowError, Resource};

    #[test]
    fn ensure_kind() {
        let a: Resource = CountableResource::typical("a").into();
        let b: Resource = Entity::typical("b").into();
        assert!(a.ensure_kind(a.kind()).is_ok());
        assert_eq!(
            a.ensure_kind(b.kind()).unwrap_err(),
            FlowError::UnequalType { expected: b.kind(), found: a.kind() }
        );
    }

    #[test]
    fn add_merges_countables_only() {
        let base = CountableResource::new("a", 1.0).unwrap();
        let mut a: Resource = base.clone().into();
        let mut b: Resource = base.with_amount(2.0).unwrap().into();
        a.add(&mut b).unwrap();
        assert_eq!(a.amount(), 3.0);
        assert_eq!(b.amount(), 0.0);

        let e = Entity::typical("e");
        let mut e1: Resource = e.duplicate().into();
        let mut e2: Resource = e.duplicate().into();
        assert!(e1.add(&mut e2).is_err());
    }

    #[test]
    fn clear_per_variant() {
        let mut c: Resource = CountableResource::new("a", 4.0).unwrap().into();
        c.clear();
        assert_eq!(c.amount(), 0.0);

        let mut e = Entity::typical("e");
        e.compose(vec![]);
        let mut r: Resource = e.into();
        r.clear();
        assert!(!r.as_entity().unwrap().is_composite());
    }
}

#[cfg(test)]
mod time {
    use crate::{FlowConfig, FlowContext, FlowError, SimTime, Tick};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(10) + 5, Tick(15));
        assert_eq!(Tick(10).offset(3), Tick(13));
    }

    #[test]
    fn simtime_total_order() {
        assert!(SimTime(1.0) < SimTime(2.0));
        assert_eq!(SimTime(1.5) + 0.5, SimTime(2.0));
        assert!(SimTime(2.0).has_reached(SimTime(2.0)));
        assert!(!SimTime(1.9).has_reached(SimTime(2.0)));
    }

    #[test]
    fn context_advances() {
        let mut ctx = FlowConfig { seed: 1, start_time: 10.0, time_step: 0.5 }
            .make_context()
            .unwrap();
        ctx.advance();
        ctx.advance();
        assert_eq!(ctx.tick, Tick(2));
        assert_eq!(ctx.now, SimTime(11.0));
    }

    #[test]
    fn context_rejects_time_reversal() {
        let mut ctx = FlowContext::seeded(0);
        ctx.advance_to(SimTime(5.0)).unwrap();
        assert!(matches!(
            ctx.advance_to(SimTime(4.0)),
            Err(FlowError::TimeReversal { .. })
        ));
        assert_eq!(ctx.now, SimTime(5.0));
    }

    #[test]
    fn config_validation() {
        let bad = FlowConfig { time_step: 0.0, ..FlowConfig::default() };
        assert!(bad.make_context().is_err());
        let bad = FlowConfig { start_time: f64::NAN, ..FlowConfig::default() };
        assert!(bad.make_context().is_err());
    }
}

#[cfg(test)]
mod sample {
    use rand_distr::Uniform;

    use crate::{Constant, Criterion, Gate, Sampler, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let dist: Box<dyn Sampler> = Box::new(Uniform::new(0.0, 1.0));
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            assert_eq!(r1.draw(dist.as_ref()), r2.draw(dist.as_ref()));
        }
    }

    #[test]
    fn criterion_comparisons() {
        assert!(Criterion::Greater.holds(2.0, 1.0));
        assert!(!Criterion::Greater.holds(1.0, 1.0));
        assert!(Criterion::GreaterOrEqual.holds(1.0, 1.0));
        assert!(Criterion::Less.holds(0.5, 1.0));
        assert!(!Criterion::Less.holds(1.0, 1.0));
        assert!(Criterion::LessOrEqual.holds(1.0, 1.0));
    }

    #[test]
    fn criterion_parses() {
        assert_eq!(">".parse::<Criterion>().unwrap(), Criterion::Greater);
        assert_eq!("le".parse::<Criterion>().unwrap(), Criterion::LessOrEqual);
        assert!("~=".parse::<Criterion>().is_err());
        assert_eq!(Criterion::GreaterOrEqual.to_string(), ">=");
    }

    #[test]
    fn gate_without_distribution_is_open() {
        let gate = Gate::default();
        let mut rng = SimRng::new(0);
        assert!(gate.passes(&mut rng));
    }

    #[test]
    fn gate_with_constant() {
        let mut gate = Gate {
            distribution: Some(Box::new(Constant(0.3))),
            threshold:    0.5,
            criterion:    Criterion::Greater,
        };
        let mut rng = SimRng::new(0);
        assert!(!gate.passes(&mut rng));
        gate.criterion = Criterion::Less;
        assert!(gate.passes(&mut rng));
        assert!(gate.set_threshold(f64::NAN).is_err());
    }

    #[test]
    fn child_streams_diverge() {
        let mut root = SimRng::new(1);
        let mut a = root.child(1);
        let mut b = root.child(2);
        let x: Vec<u64> = (0..4).map(|_| a.gen_range(0..u64::MAX)).collect();
        let y: Vec<u64> = (0..4).map(|_| b.gen_range(0..u64::MAX)).collect();
        assert_ne!(x, y);
    }
}
