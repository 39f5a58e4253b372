//! Bring-up binary driving a simulated panel out of soft pins.
//!
//! Runs a scripted timeline of button pushes, lever throws and encoder
//! turns through the real poll loop and logs every dispatched command.
//! Useful for eyeballing the scan/update/trigger plumbing without any
//! hardware or host connection attached.

use std::env::var;
use std::thread::sleep;
use std::time::Duration;

use dotenv::dotenv;
use log::{debug, info};

use flightpanel_devices::Device;
use flightpanel_devices::button::{Button, RepeatButton};
use flightpanel_devices::command::{CommandRegistry, LogDispatcher};
use flightpanel_devices::digital_in::{DigitalIn, Source};
use flightpanel_devices::encoder::{Encoder, EncoderPulses};
use flightpanel_devices::soft::{SoftMux, SoftPin, SoftPort};
use flightpanel_devices::switch::{Switch, Switch2};

/// Clockwise quadrature sequence as logical (b, a) 2-bit states.
const GRAY_UP: [u8; 4] = [0, 1, 3, 2];

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    info!("flightpanel simulated panel starting...");

    let cycles: u32 = var("PANEL_CYCLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(400);
    let period_ms: u64 = var("PANEL_PERIOD_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    // wiring: one multiplexer behind shared select lines, one port
    // expander, and the encoder on two direct pins
    let select: [SoftPin; 4] = std::array::from_fn(|_| SoftPin::new(false));
    let mux = SoftMux::new(select.clone());
    let port = SoftPort::new();
    let enc_a = SoftPin::new(true);
    let enc_b = SoftPin::new(true);

    let mut inputs = DigitalIn::new();
    inputs.set_mux_pins([&select[0], &select[1], &select[2], &select[3]]);
    let mux_exp = inputs.add_mux(&mux)?;
    let port_exp = inputs.add_expander(&port)?;
    debug!("{inputs:?}");

    let mut host = LogDispatcher::default();
    let cmd_ap = host.register_command("sim/autopilot/servos_toggle")?;
    let cmd_hdg_up = host.register_command("sim/autopilot/heading_up")?;
    let cmd_hdg_down = host.register_command("sim/autopilot/heading_down")?;
    let cmd_flaps_up = host.register_command("sim/flight_controls/flaps_up")?;
    let cmd_flaps_down = host.register_command("sim/flight_controls/flaps_down")?;
    let cmd_strobe = host.register_command("sim/lights/strobe_toggle")?;
    let cmd_trim_up = host.register_command("sim/flight_controls/pitch_trim_up")?;

    let mut ap_button = Button::new(Source::Channel { expander: mux_exp, channel: 0 });
    ap_button.set_command(cmd_ap);

    let mut trim_button = RepeatButton::new(Source::Channel { expander: mux_exp, channel: 1 }, 25);
    trim_button.set_command(cmd_trim_up);

    let mut flaps = Switch2::new(
        Source::Channel { expander: mux_exp, channel: 2 },
        Source::Channel { expander: mux_exp, channel: 3 },
    );
    flaps.set_commands_up_down(cmd_flaps_up, cmd_flaps_down);

    let mut strobe = Switch::new(Source::Channel { expander: port_exp, channel: 7 });
    strobe.set_command(cmd_strobe);

    let mut heading = Encoder::new(Source::Pin(&enc_a), Source::Pin(&enc_b), EncoderPulses::Four);
    heading.set_commands(cmd_hdg_up, cmd_hdg_down);

    let mut devices: [&mut dyn Device; 5] = [
        &mut ap_button,
        &mut trim_button,
        &mut flaps,
        &mut strobe,
        &mut heading,
    ];

    for cycle in 0..cycles {
        // scripted pilot: pushes, throws and turns at fixed cycles
        match cycle {
            20 => mux.set_channel(0, false),
            60 => mux.set_channel(0, true),
            100 => mux.set_channel(1, false),
            220 => mux.set_channel(1, true),
            250 => mux.set_channel(2, false),
            290 => mux.set_channel(2, true),
            300 => port.set_line(7, false),
            _ => {}
        }
        if (120..200).contains(&cycle) {
            let step = GRAY_UP[(cycle - 120) as usize % 4];
            enc_a.set(step & 0x01 == 0);
            enc_b.set(step & 0x02 == 0);
        }

        inputs.scan()?;
        for device in devices.iter_mut() {
            device.update(&inputs)?;
        }
        for device in devices.iter_mut() {
            device.trigger(&host)?;
        }

        sleep(Duration::from_millis(period_ms));
    }

    info!(
        "done after {cycles} cycles; heading encoder rests at {}",
        heading.pos()
    );
    Ok(())
}
