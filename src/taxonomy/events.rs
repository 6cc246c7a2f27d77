//! Sub-trial timepoint labels.

label_set! {
    /// Set of event labels. Several may be set over the course of a trial.
    pub struct Events {
        primitives {
            LED_ON = 0, "led_on";
            LED_OFF = 1, "led_off";

            /// Timepoints determined from motion tracking.
            REACH_ONSET = 2, "reach_onset";
            SLIT_IN = 3, "slit_in";
            GRASP = 4, "grasp";
            SLIT_OUT = 5, "slit_out";
            /// The second full reach on a clean correct trial only.
            SUBSEQUENT_SLIT_IN = 6, "subsequent_slit_in";
            SUBSEQUENT_GRASP = 7, "subsequent_grasp";
            SUBSEQUENT_SLIT_OUT = 8, "subsequent_slit_out";
        }
        composites {
            LED = LED_ON | LED_OFF, "led";
            SUBSEQUENT = SUBSEQUENT_SLIT_IN | SUBSEQUENT_GRASP | SUBSEQUENT_SLIT_OUT, "subsequent";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bits() {
        assert_eq!(Events::LED_ON.bits(), 1);
        assert_eq!(Events::LED_OFF.bits(), 2);
        assert_eq!(Events::REACH_ONSET.bits(), 4);
        assert_eq!(Events::LED, Events::LED_ON | Events::LED_OFF);
    }

    #[test]
    fn test_events_accumulate() {
        let mut cell = Events::empty();
        cell |= Events::LED_OFF;
        cell |= Events::REACH_ONSET;
        assert!(cell.contains(Events::LED_OFF));
        assert!(cell.contains(Events::REACH_ONSET));
        assert!(!cell.intersects(Events::LED_ON));
        assert_eq!(cell.names(), vec!["led_off", "reach_onset"]);
    }
}
