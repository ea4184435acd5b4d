//! Unit and scenario tests for rf-station.

use std::cell::RefCell;
use std::rc::Rc;

use rf_core::{CountableResource, Entity, FlowContext, FlowResult, Resource};
use rf_flow::{shared, Named, Steppable};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn patient() -> Resource {
    Resource::from(Entity::typical("patient"))
}

fn arrival(typical: &Resource) -> Resource {
    Resource::Entity(typical.as_entity().unwrap().duplicate0())
}

/// Steppable that records when it was stepped.
struct Marker {
    name: &'static str,
    log:  Rc<RefCell<Vec<&'static str>>>,
}

impl Named for Marker {
    fn name(&self) -> &str {
        self.name
    }
}

impl Steppable for Marker {
    fn step(&mut self, _ctx: &mut FlowContext) -> FlowResult<()> {
        self.log.borrow_mut().push(self.name);
        Ok(())
    }
}

// ── Pool ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pool {
    use rf_core::FlowError;

    use crate::Pool;

    #[test]
    fn acquire_and_release_stay_in_bounds() {
        let mut pool = Pool::full("beds", 3.0).unwrap();
        assert!(pool.acquire(2.0));
        assert!(!pool.acquire(2.0));
        assert_eq!(pool.available(), 1.0);
        assert_eq!(pool.in_use(), 2.0);
        pool.release(5.0);
        assert_eq!(pool.available(), 3.0);
    }

    #[test]
    fn construction_is_validated() {
        assert!(matches!(Pool::new("p", 4.0, 3.0), Err(FlowError::Config(_))));
        assert!(matches!(Pool::new("p", -1.0, 3.0), Err(FlowError::InvalidAmount(_))));
        assert!(Pool::new("p", 0.0, 3.0).is_ok());
    }
}

// ── Lock / Unlock ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod lock {
    use super::*;
    use rf_core::FlowError;
    use rf_flow::{Provider, Queue, Receiver, Sink};

    use crate::{Lock, Pool, Unlock};

    #[test]
    fn third_pass_is_declined_when_two_locks_are_held() {
        let typical = patient();
        let waiting = shared(Queue::new("waiting", &typical));
        let mut lock = Lock::with_capacity("gate", &typical, 2.0).unwrap();
        lock.add_receiver(waiting.clone()).unwrap();

        let mut ctx = FlowContext::seeded(1);
        let results: Vec<bool> = (0..3)
            .map(|_| lock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap())
            .collect();
        assert_eq!(results, vec![true, true, false]);
        assert_eq!(waiting.borrow().size(), 2.0);
        assert_eq!(lock.free_passes().unwrap(), 0.0);
    }

    #[test]
    fn declined_downstream_holds_no_lock() {
        let typical = patient();
        let mut lock = Lock::with_capacity("gate", &typical, 2.0).unwrap();
        let mut ctx = FlowContext::seeded(1);
        assert!(!lock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
        assert_eq!(lock.pool().borrow().available(), 2.0);
    }

    #[test]
    fn unlock_releases_clamped_to_maximum() {
        let typical = patient();
        let mut lock = Lock::with_capacity("gate", &typical, 2.0).unwrap();
        let mut unlock = Unlock::new("exit", &lock);
        lock.add_receiver(shared(Queue::new("inside", &typical))).unwrap();
        unlock.add_receiver(shared(Sink::new("out", &typical))).unwrap();

        let mut ctx = FlowContext::seeded(1);
        lock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap();
        lock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap();
        assert_eq!(unlock.pool().borrow().available(), 0.0);

        assert!(unlock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
        assert_eq!(lock.pool().borrow().available(), 1.0);
        for _ in 0..3 {
            assert!(unlock.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
        }
        assert_eq!(lock.pool().borrow().available(), 2.0);
    }

    #[test]
    fn countable_passes_are_capped_by_the_pool() {
        let water = Resource::from(CountableResource::typical("water"));
        let tank = shared(Queue::with_capacity("tank", &water, 4.0).unwrap());
        let mut lock = Lock::with_capacity("valve", &water, 6.0).unwrap();
        lock.add_receiver(tank.clone()).unwrap();

        let mut ctx = FlowContext::seeded(1);
        let mut offer = Resource::from(water.as_countable().unwrap().with_amount(10.0).unwrap());
        assert!(!lock.accept("test", &mut offer, 5.0, 10.0, &mut ctx).unwrap());
        assert_eq!(offer.amount(), 10.0);
        assert!(lock.accept("test", &mut offer, 0.0, 10.0, &mut ctx).unwrap());
        assert_eq!(offer.amount(), 6.0);
        assert_eq!(lock.free_passes().unwrap(), 2.0);

        assert!(!lock.accept("test", &mut offer, 3.0, 6.0, &mut ctx).unwrap());
        assert_eq!(offer.amount(), 6.0);
    }

    #[test]
    fn free_passes_reports_a_busy_pool() {
        let lock = Lock::with_capacity("gate", &patient(), 2.0).unwrap();
        let _held = lock.pool().borrow_mut();
        assert!(matches!(lock.free_passes(), Err(FlowError::CyclicOffer { .. })));
    }

    #[test]
    fn allocation_is_validated() {
        let typical = patient();
        let pool = Pool::full("staff", 2.0).unwrap().shared();
        assert!(matches!(
            Lock::new("l", &typical, pool.clone(), 3.0),
            Err(FlowError::Config(_))
        ));
        assert!(matches!(
            Lock::new("l", &typical, pool.clone(), 0.0),
            Err(FlowError::Config(_))
        ));
        assert!(matches!(
            Lock::new("l", &typical, pool, 0.5),
            Err(FlowError::NonIntegerAmount(_))
        ));
    }

    #[test]
    fn foreign_types_are_rejected() {
        let mut lock = Lock::with_capacity("gate", &patient(), 1.0).unwrap();
        let other = patient();
        let mut ctx = FlowContext::seeded(1);
        let err = lock.accept("test", &mut arrival(&other), 1.0, 1.0, &mut ctx).unwrap_err();
        assert!(matches!(err, FlowError::UnequalType { .. }));
    }
}

// ── Macro ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod composite {
    use super::*;

    use crate::Macro;

    #[test]
    fn steps_parts_in_registration_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = shared(Marker { name: "first", log: log.clone() });
        let second = shared(Marker { name: "second", log: log.clone() });

        let mut group = Macro::new("group");
        assert!(group.add_steppable(second.clone()));
        assert!(group.add_steppable(first.clone()));
        assert!(!group.add_steppable(second.clone()));

        let mut ctx = FlowContext::seeded(1);
        group.step(&mut ctx).unwrap();
        assert_eq!(*log.borrow(), vec!["second", "first"]);
        assert_eq!(group.steppables().len(), 2);
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod server {
    use super::*;
    use rf_flow::{Provider, Queue, Receiver, Sink, Source};

    use crate::{Pool, Server};

    fn clinic(staff: f64, service_time: f64) -> (Server, Rc<RefCell<Sink>>, Resource) {
        let typical = patient();
        let pool = Pool::full("doctors", staff).unwrap().shared();
        let server = Server::new("exam", &typical, pool, 1.0, service_time).unwrap();
        let sink = shared(Sink::new("discharged", &typical));
        server.add_receiver(sink.clone()).unwrap();
        (server, sink, typical)
    }

    #[test]
    fn bounds_concurrency_and_frees_slots_after_service() {
        let (mut server, sink, typical) = clinic(2.0, 2.0);
        let mut ctx = FlowContext::seeded(1);

        let admitted: Vec<bool> = (0..3)
            .map(|_| server.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap())
            .collect();
        assert_eq!(admitted, vec![true, true, false]);
        assert_eq!(server.in_service().unwrap(), 2.0);
        assert_eq!(server.pool().borrow().available(), 0.0);

        ctx.advance();
        server.step(&mut ctx).unwrap();
        assert_eq!(sink.borrow().received(), 0.0);

        ctx.advance();
        server.step(&mut ctx).unwrap();
        assert_eq!(sink.borrow().received(), 2.0);
        assert_eq!(server.pool().borrow().available(), 2.0);
        assert!(server.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
    }

    #[test]
    fn servers_sharing_a_pool_compete_for_it() {
        let typical = patient();
        let pool = Pool::full("nurse", 1.0).unwrap().shared();
        let mut a = Server::new("triage", &typical, pool.clone(), 1.0, 1.0).unwrap();
        let mut b = Server::new("x-ray", &typical, pool.clone(), 1.0, 1.0).unwrap();
        let mut ctx = FlowContext::seeded(1);
        assert!(a.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
        assert!(!b.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap());
    }

    #[test]
    fn served_items_hold_their_slot_until_taken() {
        let typical = patient();
        let pool = Pool::full("doctors", 1.0).unwrap().shared();
        let mut server = Server::new("exam", &typical, pool, 1.0, 1.0).unwrap();
        let mut ctx = FlowContext::seeded(1);
        server.accept("test", &mut arrival(&typical), 1.0, 1.0, &mut ctx).unwrap();

        for _ in 0..3 {
            ctx.advance();
            server.step(&mut ctx).unwrap();
            assert_eq!(server.in_service().unwrap(), 1.0);
            assert_eq!(server.pool().borrow().available(), 0.0);
        }

        let sink = shared(Sink::new("late", &typical));
        server.add_receiver(sink.clone()).unwrap();
        ctx.advance();
        server.step(&mut ctx).unwrap();
        assert_eq!(sink.borrow().received(), 1.0);
        assert_eq!(server.pool().borrow().available(), 1.0);
    }

    #[test]
    fn clinic_pipeline_conserves_patients() {
        let (server, sink, typical) = clinic(2.0, 3.0);
        let server = shared(server);
        let arrivals = shared(Source::new("arrivals", &typical));
        let waiting = shared(Queue::new("waiting", &typical));
        arrivals.borrow_mut().add_receiver(waiting.clone()).unwrap();
        waiting.borrow_mut().add_receiver(server.clone()).unwrap();

        let mut ctx = FlowContext::seeded(1);
        for tick in 1..=10 {
            arrivals.borrow_mut().step(&mut ctx).unwrap();
            waiting.borrow_mut().step(&mut ctx).unwrap();
            server.borrow_mut().step(&mut ctx).unwrap();

            let in_service = server.borrow().in_service().unwrap();
            assert!(in_service <= 2.0, "tick {tick}: {in_service} in service");
            let accounted = waiting.borrow().size() + in_service + sink.borrow().received();
            assert_eq!(accounted, tick as f64);
            ctx.advance();
        }
        assert!(sink.borrow().received() > 0.0);
        assert_eq!(server.borrow().name(), "exam");
    }

    fn litres(water: &Resource, amount: f64) -> Resource {
        Resource::from(water.as_countable().unwrap().with_amount(amount).unwrap())
    }

    #[test]
    fn countable_service_returns_every_unit_to_the_pool() {
        let water = Resource::from(CountableResource::typical("water"));
        let pool = Pool::full("pumps", 6.0).unwrap().shared();
        let mut server = Server::new("filter", &water, pool, 2.0, 1.0).unwrap();
        let sink = shared(Sink::new("reservoir", &water));
        server.add_receiver(sink.clone()).unwrap();

        let mut ctx = FlowContext::seeded(1);
        let mut first = litres(&water, 2.0);
        let mut second = litres(&water, 5.0);
        assert!(server.accept("test", &mut first, 0.0, 2.0, &mut ctx).unwrap());
        assert!(server.accept("test", &mut second, 0.0, 5.0, &mut ctx).unwrap());
        assert_eq!(first.amount(), 0.0);
        assert_eq!(second.amount(), 4.0, "only one more unit fits the pool");
        assert_eq!(server.in_service().unwrap(), 3.0);
        assert_eq!(server.pool().borrow().available(), 0.0);

        for _ in 0..3 {
            ctx.advance();
            server.step(&mut ctx).unwrap();
        }
        assert_eq!(sink.borrow().received(), 3.0);
        assert_eq!(server.in_service().unwrap(), 0.0);
        assert_eq!(server.pool().borrow().available(), 6.0);
    }

    #[test]
    fn partial_takes_release_only_what_left() {
        let water = Resource::from(CountableResource::typical("water"));
        let pool = Pool::full("pumps", 6.0).unwrap().shared();
        let mut server = Server::new("filter", &water, pool, 2.0, 1.0).unwrap();
        let bottle = shared(Queue::with_capacity("bottle", &water, 1.0).unwrap());
        server.add_receiver(bottle.clone()).unwrap();

        let mut ctx = FlowContext::seeded(1);
        assert!(server.accept("test", &mut litres(&water, 3.0), 0.0, 3.0, &mut ctx).unwrap());
        for _ in 0..3 {
            ctx.advance();
            server.step(&mut ctx).unwrap();
            let in_use = server.pool().borrow().in_use();
            assert_eq!(in_use, 2.0 * server.in_service().unwrap());
        }
        assert_eq!(bottle.borrow().size(), 1.0);
        assert_eq!(server.in_service().unwrap(), 2.0);
        assert_eq!(server.pool().borrow().available(), 2.0);
    }
}
