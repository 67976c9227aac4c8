#[macro_use]
extern crate colour;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use synclogic::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CYCLES: u64 = 600;

fn simulate(running: Arc<AtomicBool>) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut system = System::with_config(SystemConfig::default().frequency(1e3))?;
    let clock = system.add_named_module("clock", ClockSource::default())?;
    let register = system.add_named_module("register", CountingRegister::new(0))?;
    let bus = system.add_named_module("bus", Bus)?;
    let zero = system.add_named_module("zero", Not)?;

    system.connect_const(register, CountingRegister::CR_INC, 1)?;
    system.connect_const(register, CountingRegister::CR_EN, 1)?;
    system.connect(bus, Bus::BUS_DATA_IN, register, CountingRegister::CR_DATA_OUT)?;
    system.connect(zero, Not::NOT_IN, register, CountingRegister::CR_Z.not())?;
    system.connect_halt(zero, Not::NOT_OUT)?;

    system.add_scope("counter")?;
    system.monitor_clock("counter")?;
    system.monitor("counter", clock, ClockSource::CLK_OUT)?;
    system.monitor_module("counter", register)?;
    system.monitor("counter", bus, Bus::BUS_DATA_OUT)?;

    system.on_halt(|cycle| {
        yellow_ln!("Register wrapped around at cycle {}", cycle);
    });
    system.init()?;

    while running.load(Ordering::SeqCst) && system.cycle() < CYCLES {
        if !system.step(false)? {
            break;
        }
    }
    info!(
        "Stopped at cycle {} with bus value {}",
        system.cycle(),
        system.get_output("bus", "BUS_DATA_OUT")?
    );

    std::fs::write("counter.vcd", system.vcd(&[])?)?;
    system.dump_dot("counter.dot")?;
    info!("Wrote counter.vcd and counter.dot");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let handler_running = running.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_running.store(false, Ordering::SeqCst)) {
        e_red_ln!("Couldn't set the ctrl-c handler: {}", e);
    }

    if let Err(e) = simulate(running) {
        e_red_ln!("{}", e);
        std::process::exit(1);
    }
}
