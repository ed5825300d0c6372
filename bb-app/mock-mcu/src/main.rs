use bb_core::mk_static;
use bb_core::utils::controllers::{EchoPulse, ServoOutput, Sonar};
use bb_core::utils::{COMMAND_CHANNEL, SystemCommand, SystemController};
use clap::Parser;
use core::cell::RefCell;
use embassy_executor::Executor;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use embedded_hal_mock::eh1::delay::StdSleep;
use static_cell::StaticCell;
use std::convert::Infallible;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &[u8] = b"bb-sim 0.1";

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// Linear units per second at full speed
    #[clap(long)]
    linear_speed: Option<f32>,
    /// Degrees per second at full speed
    #[clap(long)]
    angular_speed: Option<f32>,
    /// Simulated line-state register (bit 4 = L2 ... bit 0 = R2)
    #[clap(long, default_value_t = 0b0_0100)]
    line_state: u8,
    /// Simulated echo width in microseconds, 0 for no echo
    #[clap(long, default_value_t = 1480)]
    echo_us: u32,
    /// File with one JSON command per line
    #[clap(long)]
    script: Option<PathBuf>,
    /// JSON commands, run after the script
    commands: Vec<String>,
}

/// Register file standing in for the peripheral controller.
struct SimBus {
    registers: [u8; 256],
    selected: u8,
}

impl SimBus {
    fn new(line_state: u8) -> Self {
        let mut registers = [0u8; 256];
        registers[0x1d] = line_state;
        registers[0x32] = VERSION.len() as u8;
        registers[0x33..0x33 + VERSION.len()].copy_from_slice(VERSION);
        Self {
            registers,
            selected: 0,
        }
    }
}

impl i2c::ErrorType for SimBus {
    type Error = Infallible;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    info!("i2c 0x{:02X} <- {:02X?}", address, bytes);
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.selected = reg;
                        for (i, &b) in data.iter().enumerate() {
                            self.registers[(reg as usize + i) % 256] = b;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.registers[(self.selected as usize + i) % 256];
                    }
                    info!("i2c 0x{:02X} -> {:02X?}", address, buf);
                }
            }
        }
        Ok(())
    }
}

struct SimTrigger;

impl digital::ErrorType for SimTrigger {
    type Error = Infallible;
}

impl OutputPin for SimTrigger {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        tracing::trace!("trigger low");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        tracing::trace!("trigger high");
        Ok(())
    }
}

struct SimEcho(u32);

impl EchoPulse for SimEcho {
    type Error = Infallible;

    fn pulse_width_us(
        &mut self,
        timeout_us: u32,
    ) -> Result<u32, Self::Error> {
        Ok(if self.0 > timeout_us { 0 } else { self.0 })
    }
}

struct SimServo;

impl ServoOutput for SimServo {
    type Error = Infallible;

    fn write_angle(
        &mut self,
        degrees: u8,
    ) -> Result<(), Self::Error> {
        info!("Head: {} deg", degrees);
        Ok(())
    }
}

type Controller =
    SystemController<'static, SimBus, StdSleep, Sonar<SimTrigger, SimEcho, StdSleep>, SimServo>;

#[embassy_executor::task]
async fn controller_task(mut ctrl: Controller) -> ! {
    ctrl.run().await
}

#[embassy_executor::task]
async fn script_task(commands: Vec<SystemCommand>) {
    let count = commands.len();
    for cmd in commands {
        COMMAND_CHANNEL.sender().send(cmd).await;
    }
    info!("{} commands queued, Ctrl-C to exit", count);
}

fn load_commands(opts: &Opts) -> Result<Vec<SystemCommand>, Box<dyn std::error::Error>> {
    let mut lines = Vec::new();
    if let Some(path) = &opts.script {
        let text = std::fs::read_to_string(path)?;
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    lines.extend(opts.commands.iter().cloned());

    let mut commands = Vec::with_capacity(lines.len());
    for line in &lines {
        let cmd = serde_json::from_str(line).map_err(|e| format!("{}: {}", line, e))?;
        commands.push(cmd);
    }
    Ok(commands)
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts: Opts = Opts::parse();
    let commands = match load_commands(&opts) {
        Ok(c) => c,
        Err(e) => {
            error!("Bad command: {}", e);
            std::process::exit(2);
        }
    };

    let i2c_bus = mk_static!(RefCell<SimBus>, RefCell::new(SimBus::new(opts.line_state)));
    let sonar = Sonar::new(SimTrigger, SimEcho(opts.echo_us), StdSleep::new());
    let mut ctrl: Controller = match SystemController::new(
        i2c_bus,
        StdSleep::new(),
        sonar,
        SimServo,
        opts.linear_speed,
        opts.angular_speed,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid calibration: {}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = ctrl.init() {
        warn!("Init failed: {}", e);
    }

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(controller_task(ctrl)).unwrap();
        spawner.spawn(script_task(commands)).unwrap();
    });
}
