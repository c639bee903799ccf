//! Per-port shorthand methods
//!
//! `ftd.i1()`, `ftd.o3(true)`, `ftd.m2_left(None, Some(38))` and friends,
//! each a thin wrapper over the generic [`FtDuino`] API.

use crate::device::FtDuino;
use crate::serial_driver::SerialTransport;
use ftduino_core::{CounterMode, InputMode, MotorDirection, OutputValue, Port, Result};

macro_rules! input_ports {
    ($( $port:ident => $get:ident, $mode:ident; )+) => {
        $(
            #[doc = concat!("Read input ", stringify!($port))]
            pub fn $get(&mut self) -> Result<i32> {
                self.input_get(Port::$port)
            }

            #[doc = concat!("Set the measurement mode of input ", stringify!($port))]
            pub fn $mode(&mut self, mode: InputMode) -> Result<()> {
                self.input_set_mode(Port::$port, mode)
            }
        )+
    };
}

macro_rules! output_ports {
    ($( $port:ident => $set:ident; )+) => {
        $(
            #[doc = concat!("Drive output ", stringify!($port))]
            pub fn $set(&mut self, value: impl Into<OutputValue>) -> Result<()> {
                self.output_write(Port::$port, value.into())
            }
        )+
    };
}

macro_rules! counter_ports {
    ($( $port:ident => $get:ident, $clear:ident, $state:ident, $mode:ident; )+) => {
        $(
            #[doc = concat!("Value of counter ", stringify!($port))]
            pub fn $get(&mut self) -> Result<i32> {
                self.counter_get(Port::$port)
            }

            pub fn $clear(&mut self) -> Result<()> {
                self.counter_clear(Port::$port)
            }

            pub fn $state(&mut self) -> Result<bool> {
                self.counter_get_state(Port::$port)
            }

            pub fn $mode(&mut self, mode: CounterMode) -> Result<()> {
                self.counter_set_mode(Port::$port, mode)
            }
        )+
    };
}

macro_rules! motor_ports {
    ($(
        $port:ident => $left:ident, $right:ident, $brake:ident, $off:ident,
                       $active:ident, $set_brake:ident;
    )+) => {
        $(
            #[doc = concat!("Turn motor ", stringify!($port), " left, optionally for `steps` counts")]
            pub fn $left(&mut self, pwm: Option<u32>, steps: Option<u32>) -> Result<()> {
                self.motor_run(Port::$port, MotorDirection::Left, pwm, steps)
            }

            #[doc = concat!("Turn motor ", stringify!($port), " right, optionally for `steps` counts")]
            pub fn $right(&mut self, pwm: Option<u32>, steps: Option<u32>) -> Result<()> {
                self.motor_run(Port::$port, MotorDirection::Right, pwm, steps)
            }

            pub fn $brake(&mut self, pwm: Option<u32>, steps: Option<u32>) -> Result<()> {
                self.motor_run(Port::$port, MotorDirection::Brake, pwm, steps)
            }

            pub fn $off(&mut self, steps: Option<u32>) -> Result<()> {
                self.motor_run(Port::$port, MotorDirection::Off, None, steps)
            }

            pub fn $active(&mut self) -> Result<bool> {
                self.motor_counter_active(Port::$port)
            }

            pub fn $set_brake(&mut self, enable: bool) -> Result<()> {
                self.motor_counter_set_brake(Port::$port, enable)
            }
        )+
    };
}

impl<T: SerialTransport> FtDuino<T> {
    input_ports! {
        I1 => i1, i1_mode;
        I2 => i2, i2_mode;
        I3 => i3, i3_mode;
        I4 => i4, i4_mode;
        I5 => i5, i5_mode;
        I6 => i6, i6_mode;
        I7 => i7, i7_mode;
        I8 => i8, i8_mode;
    }

    output_ports! {
        O1 => o1;
        O2 => o2;
        O3 => o3;
        O4 => o4;
        O5 => o5;
        O6 => o6;
        O7 => o7;
        O8 => o8;
    }

    counter_ports! {
        C1 => c1, c1_clear, c1_state, c1_mode;
        C2 => c2, c2_clear, c2_state, c2_mode;
        C3 => c3, c3_clear, c3_state, c3_mode;
        C4 => c4, c4_clear, c4_state, c4_mode;
    }

    motor_ports! {
        M1 => m1_left, m1_right, m1_brake, m1_off, m1_counter_active, m1_counter_brake;
        M2 => m2_left, m2_right, m2_brake, m2_off, m2_counter_active, m2_counter_brake;
        M3 => m3_left, m3_right, m3_brake, m3_off, m3_counter_active, m3_counter_brake;
        M4 => m4_left, m4_right, m4_brake, m4_off, m4_counter_active, m4_counter_brake;
    }

    /// Switch the onboard LED
    pub fn led(&mut self, on: bool) -> Result<()> {
        self.led_set(on)
    }

    /// Distance reported by the ultrasonic sensor
    pub fn ultrasonic(&mut self) -> Result<i32> {
        self.ultrasonic_get()
    }
}

#[cfg(test)]
mod tests {
    use crate::device::FtDuino;
    use crate::mock::MockTransport;
    use ftduino_core::{CounterMode, InputMode, OutputLevel};

    #[test]
    fn test_input_shorthands() {
        let mut mock = MockTransport::new();
        mock.queue_line("1").queue_line("3300");
        let mut ftd = FtDuino::with_transport(mock);

        assert_eq!(ftd.i1().unwrap(), 1);
        ftd.i8_mode(InputMode::Voltage).unwrap();
        assert_eq!(ftd.i8().unwrap(), 3300);

        assert_eq!(
            ftd.transport().written(),
            ["input_get I1\n", "input_set_mode I8 voltage\n", "input_get I8\n"]
        );
    }

    #[test]
    fn test_output_shorthands() {
        let mut ftd = FtDuino::with_transport(MockTransport::new());

        ftd.o1(true).unwrap();
        ftd.o2(false).unwrap();
        ftd.o7((OutputLevel::Low, 100)).unwrap();

        assert_eq!(
            ftd.transport().written(),
            [
                "output_set O1 1 512\n",
                "output_set O2 0 0\n",
                "output_set O7 2 100\n"
            ]
        );
    }

    #[test]
    fn test_output_shorthand_rejects_bad_pwm() {
        let mut ftd = FtDuino::with_transport(MockTransport::new());

        assert!(ftd.o1((OutputLevel::High, 600)).is_err());
        assert!(ftd.transport().written().is_empty());
    }

    #[test]
    fn test_counter_shorthands() {
        let mut mock = MockTransport::new();
        mock.queue_line("12").queue_line("1");
        let mut ftd = FtDuino::with_transport(mock);

        ftd.c3_mode(CounterMode::Any).unwrap();
        assert_eq!(ftd.c3().unwrap(), 12);
        assert!(ftd.c3_state().unwrap());
        ftd.c3_clear().unwrap();

        assert_eq!(
            ftd.transport().written(),
            [
                "counter_set_mode C3 any\n",
                "counter_get C3\n",
                "counter_get_state C3\n",
                "counter_clear C3\n"
            ]
        );
    }

    #[test]
    fn test_motor_shorthands() {
        let mut mock = MockTransport::new();
        mock.queue_reply(b"\n")
            .queue_reply(b"\n")
            .queue_reply(b"\n")
            .queue_line("1");
        let mut ftd = FtDuino::with_transport(mock);

        ftd.m1_left(None, None).unwrap();
        ftd.m2_right(Some(200), Some(38)).unwrap();
        ftd.m4_off(None).unwrap();
        assert!(ftd.m2_counter_active().unwrap());
        ftd.m2_counter_brake(false).unwrap();
        ftd.m3_brake(None, None).unwrap();

        assert_eq!(
            ftd.transport().written(),
            [
                "motor_set M1 left 512\n",
                "motor_counter M2 right 200 38\n",
                "motor_set M4 off 0\n",
                "motor_counter_active M2\n",
                "motor_counter_set_brake M2 false\n",
                "motor_set M3 brake 512\n"
            ]
        );
    }

    #[test]
    fn test_led_and_ultrasonic_shorthands() {
        let mut mock = MockTransport::new();
        mock.queue_reply(b"\n").queue_line("27");
        let mut ftd = FtDuino::with_transport(mock);

        ftd.led(true).unwrap();
        assert_eq!(ftd.ultrasonic().unwrap(), 27);

        assert_eq!(ftd.transport().written(), ["led_set 1\n", "ultrasonic_get\n"]);
    }
}
