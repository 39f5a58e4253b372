//! Full poll-cycle tests over a simulated panel: one multiplexer with
//! a pushbutton and a three-way switch, a port expander with an
//! on/off switch, and an encoder on direct pins.

use flightpanel_devices::DEBOUNCE_CYCLES;
use flightpanel_devices::Device;
use flightpanel_devices::button::Button;
use flightpanel_devices::command::{
    CommandHandle, CommandRegistry, Dispatch, LogDispatcher, RecordingDispatcher,
};
use flightpanel_devices::digital_in::{DigitalIn, Source};
use flightpanel_devices::encoder::{Encoder, EncoderPulses};
use flightpanel_devices::soft::{SoftMux, SoftPin, SoftPort};
use flightpanel_devices::switch::{Switch, Switch2};

fn cycles(
    n: u32,
    inputs: &DigitalIn<'_>,
    devices: &mut [&mut dyn Device],
    dispatch: &RecordingDispatcher,
) {
    for _ in 0..n {
        inputs.scan().unwrap();
        for device in devices.iter_mut() {
            device.update(inputs).unwrap();
        }
        for device in devices.iter_mut() {
            device.trigger(dispatch).unwrap();
        }
    }
}

#[test]
fn mixed_panel_dispatches_expected_commands() {
    let select: [SoftPin; 4] = std::array::from_fn(|_| SoftPin::new(false));
    let mux = SoftMux::new(select.clone());
    let port = SoftPort::new();
    let enc_a = SoftPin::new(true);
    let enc_b = SoftPin::new(true);

    let mut inputs = DigitalIn::new();
    inputs.set_mux_pins([&select[0], &select[1], &select[2], &select[3]]);
    let mux_exp = inputs.add_mux(&mux).unwrap();
    let port_exp = inputs.add_expander(&port).unwrap();

    let mut host = LogDispatcher::default();
    let cmd_ap = host.register_command("sim/autopilot/servos_toggle").unwrap();
    let cmd_hdg_up = host.register_command("sim/autopilot/heading_up").unwrap();
    let cmd_hdg_down = host.register_command("sim/autopilot/heading_down").unwrap();
    let cmd_gear_up = host.register_command("sim/flight_controls/gear_up").unwrap();
    let cmd_gear_down = host.register_command("sim/flight_controls/gear_down").unwrap();
    let cmd_strobe = host.register_command("sim/lights/strobe_toggle").unwrap();

    let mut ap_button = Button::new(Source::Channel { expander: mux_exp, channel: 0 });
    ap_button.set_command(cmd_ap);

    let mut gear = Switch2::new(
        Source::Channel { expander: mux_exp, channel: 1 },
        Source::Channel { expander: mux_exp, channel: 2 },
    );
    gear.set_commands_up_down(cmd_gear_up, cmd_gear_down);

    let mut strobe = Switch::new(Source::Channel { expander: port_exp, channel: 7 });
    strobe.set_command(cmd_strobe);

    let mut heading = Encoder::new(Source::Pin(&enc_a), Source::Pin(&enc_b), EncoderPulses::One);
    heading.set_commands(cmd_hdg_up, cmd_hdg_down);

    let rec = RecordingDispatcher::new();
    {
        let mut devices: [&mut dyn Device; 4] =
            [&mut ap_button, &mut gear, &mut strobe, &mut heading];

        // quiet panel: nothing fires
        cycles(5, &inputs, &mut devices, &rec);
        assert!(rec.take().is_empty());

        // push and release the AP button
        mux.set_channel(0, false);
        cycles(2, &inputs, &mut devices, &rec);
        mux.set_channel(0, true);
        cycles(DEBOUNCE_CYCLES as u32 + 1, &inputs, &mut devices, &rec);
        assert_eq!(
            rec.take(),
            vec![Dispatch::Start(cmd_ap), Dispatch::End(cmd_ap)]
        );

        // gear lever down (on1) and back to neutral
        mux.set_channel(1, false);
        cycles(DEBOUNCE_CYCLES as u32 + 1, &inputs, &mut devices, &rec);
        mux.set_channel(1, true);
        cycles(DEBOUNCE_CYCLES as u32 + 1, &inputs, &mut devices, &rec);
        assert_eq!(
            rec.take(),
            vec![
                Dispatch::Trigger(cmd_gear_up),
                Dispatch::Trigger(cmd_gear_down),
            ]
        );

        // strobe switch on the port expander
        port.set_line(7, false);
        cycles(2, &inputs, &mut devices, &rec);
        assert_eq!(rec.take(), vec![Dispatch::Trigger(cmd_strobe)]);
    }
    assert!(strobe.is_on());
    assert_eq!(gear.value(1.0, 0.0, -1.0), 0.0);
}

#[test]
fn encoder_on_a_shared_mux_uses_live_samples() {
    let select: [SoftPin; 4] = std::array::from_fn(|_| SoftPin::new(false));
    let mux = SoftMux::new(select.clone());

    let mut inputs = DigitalIn::new();
    inputs.set_mux_pins([&select[0], &select[1], &select[2], &select[3]]);
    let exp = inputs.add_mux(&mux).unwrap();

    let mut enc = Encoder::new(
        Source::Channel { expander: exp, channel: 14 },
        Source::Channel { expander: exp, channel: 15 },
        EncoderPulses::One,
    );

    let rec = RecordingDispatcher::new();
    let up = CommandHandle::new(0);
    let down = CommandHandle::new(1);
    enc.set_commands(up, down);

    // one full clockwise Gray cycle, never calling scan(): the direct
    // reads must see every step regardless of the stale cache
    for step in [1u8, 3, 2, 0] {
        mux.set_channel(14, step & 0x01 == 0);
        mux.set_channel(15, step & 0x02 == 0);
        enc.update(&inputs).unwrap();
    }
    assert_eq!(enc.pos(), 4);
    for _ in 0..4 {
        enc.trigger(&rec).unwrap();
    }
    assert_eq!(rec.take(), vec![Dispatch::Trigger(up); 4]);
}

#[test]
fn transitions_survive_until_consumed_exactly_once() {
    let pin = SoftPin::new(true);
    let inputs = DigitalIn::new();
    let rec = RecordingDispatcher::new();
    let cmd = CommandHandle::new(9);
    let mut button = Button::new(Source::Pin(&pin));
    button.set_command(cmd);

    pin.set(false);
    button.update(&inputs).unwrap();
    // several cycles without trigger: the pending press persists
    for _ in 0..3 {
        button.update(&inputs).unwrap();
    }
    button.trigger(&rec).unwrap();
    // a second trigger without an update fires nothing
    button.trigger(&rec).unwrap();
    assert_eq!(rec.take(), vec![Dispatch::Start(cmd)]);
}
