//! clinic — a walk-in clinic built from rf-flow / rf-station parts.
//!
//! ```text
//! arrivals ──▶ waiting room ──▶ exam (2 doctors) ──▶ billing ──▶ revenue
//!  (Poisson)     (cap 20)        (Exp service)       (1 → 3)
//! ```
//!
//! Run with `RUST_LOG=debug` to see individual events.

use anyhow::Result;
use rand_distr::{Exp, Poisson};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rf_core::{CountableResource, Entity, FlowConfig, Resource};
use rf_flow::{shared, Provider, Queue, Sink, Source, Steppable, Transformer};
use rf_station::{Pool, Server};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:               u64 = 42;
const DOCTORS:            f64 = 2.0;
const WAITING_CAPACITY:   f64 = 20.0;
const MEAN_ARRIVALS:      f64 = 1.5;  // patients per tick
const MEAN_SERVICE_TICKS: f64 = 1.2;
const BILL_PER_PATIENT:   f64 = 3.0;
const TICKS_PER_DAY:      u64 = 12;
const SIM_DAYS:           u64 = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let patient = Resource::from(Entity::typical("patient"));
    let bill = Resource::from(CountableResource::typical("bill"));

    // 1. Components.
    let arrivals = shared(Source::new("arrivals", &patient));
    arrivals
        .borrow_mut()
        .set_amount_distribution(Some(Box::new(Poisson::new(MEAN_ARRIVALS)?)));

    let waiting = shared(Queue::with_capacity("waiting", &patient, WAITING_CAPACITY)?);

    let doctors = Pool::full("doctors", DOCTORS)?.shared();
    let exam = Server::new("exam", &patient, doctors.clone(), 1.0, MEAN_SERVICE_TICKS)?;
    exam.set_service_distribution(Some(Box::new(Exp::new(1.0 / MEAN_SERVICE_TICKS)?)))?;
    let exam = shared(exam);

    let billing = shared(Transformer::new("billing", &patient, &bill, 1.0, BILL_PER_PATIENT)?);
    let revenue = shared(Sink::new("revenue", &bill));

    // 2. Wiring.
    arrivals.borrow_mut().add_receiver(waiting.clone())?;
    waiting.borrow_mut().add_receiver(exam.clone())?;
    exam.borrow().add_receiver(billing.clone())?;
    billing.borrow_mut().add_receiver(revenue.clone())?;

    // 3. Run.
    let mut ctx = FlowConfig::with_seed(SEED).make_context()?;
    info!(seed = SEED, days = SIM_DAYS, ticks_per_day = TICKS_PER_DAY, "clinic opens");

    for day in 1..=SIM_DAYS {
        for _ in 0..TICKS_PER_DAY {
            arrivals.borrow_mut().step(&mut ctx)?;
            waiting.borrow_mut().step(&mut ctx)?;
            exam.borrow_mut().step(&mut ctx)?;
            ctx.advance();
        }
        info!(
            day,
            admitted    = arrivals.borrow().core().total_provided(),
            waiting     = waiting.borrow().size(),
            in_exam     = exam.borrow().in_service()?,
            outside     = arrivals.borrow().available(),
            billed      = revenue.borrow().received(),
            "end of day"
        );
    }

    println!();
    println!("Patients seen:   {}", billing.borrow().consumed());
    println!("Revenue (bills): {}", revenue.borrow().received());
    println!("Doctors free:    {}/{}", doctors.borrow().available(), DOCTORS);
    Ok(())
}
