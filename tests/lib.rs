#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use core::time::Duration;
    use modcan::{
        frame::{self, ProtocolError},
        state::{command, DriveState},
        Axis, AxisError, AxisMove, AxisSet, GatewaySocket,
        HomingProfile, MotionProfile, Positioning, StatusWord, Timing,
        };

    /// timing policy keeping the poll loops fast enough for tests
    fn fast() -> Timing {
        Timing {
            response: Duration::from_millis(100),
            settle: Duration::from_millis(1),
            poll: Duration::from_millis(1),
            transition_polls: 4,
            homing_polls: 10,
            motion_polls: 10,
        }
    }

    /**
        in-memory axis controller: parses every request like the real gateway and replies
        from a scripted statusword sequence, recording everything written to it
    */
    struct DriveMock {
        /// statusword values returned by successive statusword reads, last one repeats
        statuses: VecDeque<u16>,
        last_status: u16,
        /// every controlword value written, in order
        controlwords: Vec<u16>,
        /// every object write as (index, sub, value)
        writes: Vec<(u16, u8, u64)>,
        /// transaction id of every request received
        transactions: Vec<u16>,
        mode_display: u8,
        /// when set, the drive never acknowledges a mode switch
        mode_sticky: bool,
        position: i32,
        /// when set, replies are truncated to this many bytes
        truncate: Option<usize>,
        pending: Option<Vec<u8>>,
    }

    impl DriveMock {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: statuses.iter().copied().collect(),
                last_status: statuses.last().copied().unwrap_or(0),
                controlwords: Vec::new(),
                writes: Vec::new(),
                transactions: Vec::new(),
                mode_display: 0,
                mode_sticky: false,
                position: 0,
                truncate: None,
                pending: None,
            }
        }
        fn next_status(&mut self) -> u16 {
            match self.statuses.pop_front() {
                Some(status) => {
                    self.last_status = status;
                    status
                }
                None => self.last_status,
            }
        }
        fn response(value: u64, size: usize) -> Vec<u8> {
            let mut buffer = vec![0; frame::DATA_OFFSET];
            buffer[7] = 0x2b;
            buffer[8] = 0x0d;
            buffer.extend_from_slice(&value.to_le_bytes()[.. size]);
            buffer
        }
    }

    impl GatewaySocket for DriveMock {
        async fn send(&mut self, data: &[u8]) -> io::Result<()> {
            self.transactions.push(u16::from_be_bytes([data[0], data[1]]));
            let direction = data[9];
            let index = u16::from_be_bytes([data[12], data[13]]);
            let sub = data[14];
            let size = data[18] as usize;

            let reply = if direction == 1 {
                let mut raw = [0; 8];
                raw[.. size].copy_from_slice(&data[19 .. 19 + size]);
                let value = u64::from_le_bytes(raw);
                self.writes.push((index, sub, value));
                match index {
                    0x6040 => self.controlwords.push(value as u16),
                    0x6060 if ! self.mode_sticky => self.mode_display = value as u8,
                    _ => (),
                }
                Self::response(0, 0)
            } else {
                let value = match index {
                    0x6041 => self.next_status() as u64,
                    0x6061 => self.mode_display as u64,
                    0x6064 => self.position as u32 as u64,
                    0x1000 => 0x0002_0192,
                    _ => 0,
                };
                Self::response(value, size)
            };
            self.pending = Some(match self.truncate {
                Some(cut) => reply[.. cut.min(reply.len())].to_vec(),
                None => reply,
            });
            Ok(())
        }
        async fn receive(&mut self, data: &mut [u8]) -> io::Result<usize> {
            let reply = self.pending.take()
                .ok_or_else(|| io::Error::new(io::ErrorKind::WouldBlock, "no request pending"))?;
            data[.. reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        }
    }

    /// the start bit must pulse as a rising edge: set once, cleared by the very next write
    fn assert_rising_edge(controlwords: &[u16]) {
        assert!(
            controlwords.iter().any(|word| word & 0x10 != 0),
            "no start bit was ever set: {controlwords:04x?}",
        );
        for pair in controlwords.windows(2) {
            if pair[0] & 0x10 != 0 {
                assert!(pair[1] & 0x10 == 0, "start bit left set across consecutive writes: {controlwords:04x?}");
                assert_eq!(pair[0] & ! 0x10, pair[1], "start bit not cleared on the same resting value: {controlwords:04x?}");
            }
        }
        assert!(controlwords.last().unwrap() & 0x10 == 0, "start bit still set after the sequence");
    }

    // ---------------- frame codec ----------------

    #[test]
    fn encode_read_matches_wire_fixture() {
        // statusword read telegram as captured from the commissioning scripts
        let frame = frame::encode_read(0, 0x6041, 0, 2).unwrap();
        assert_eq!(
            frame.as_ref(),
            [0, 0,  0, 0,  0, 13,  0,  0x2b, 0x0d, 0, 0, 0,  0x60, 0x41, 0,  0, 0,  0,  2],
        );
    }

    #[test]
    fn encode_write_matches_wire_fixture() {
        // "start positioning" controlword write telegram
        let frame = frame::encode_write(0, 0x6040, 0, 0x001f, 2).unwrap();
        assert_eq!(
            frame.as_ref(),
            [0, 0,  0, 0,  0, 15,  0,  0x2b, 0x0d, 1, 0, 0,  0x60, 0x40, 0,  0, 0,  0,  2,  0x1f, 0x00],
        );
    }

    #[test]
    fn encode_carries_transaction_and_little_endian_payload() {
        let frame = frame::encode_write(0x1234, 0x609a, 0, 100_000, 4).unwrap();
        assert_eq!(&frame[.. 2], [0x12, 0x34]);
        assert_eq!(&frame[4 .. 6], [0, 17]);
        // 100000 = 0x000186a0 little-endian
        assert_eq!(&frame[19 ..], [0xa0, 0x86, 0x01, 0x00]);
    }

    #[test]
    fn encode_rejects_unsupported_sizes() {
        assert_eq!(frame::encode_read(0, 0x6041, 0, 3), Err(ProtocolError::InvalidSize(3)));
        assert_eq!(frame::encode_write(0, 0x6040, 0, 0, 8), Err(ProtocolError::InvalidSize(8)));
    }

    #[test]
    fn decode_extracts_payload_at_fixed_offset() {
        let mut response = vec![0; 19];
        response[7] = 0x2b;
        response.extend_from_slice(&[0x27, 0x00]);
        let value = frame::decode_response(&response, Some(2)).unwrap().unwrap();
        assert_eq!(value, 0x0027);
        assert_eq!(DriveState::classify(value as u16), DriveState::OperationEnabled);
    }

    #[test]
    fn decode_never_turns_a_short_response_into_a_value() {
        for len in 0 .. 19 {
            let response = vec![0; len];
            assert_eq!(
                frame::decode_response(&response, Some(2)),
                Err(ProtocolError::ShortResponse(len)),
                "a {len} byte buffer must never decode as a read payload",
            );
        }
        // 19 bytes is still one byte short of a 2 byte payload
        let mut response = vec![0; 20];
        response[7] = 0x2b;
        assert_eq!(frame::decode_response(&response, Some(2)), Err(ProtocolError::ShortResponse(20)));
    }

    #[test]
    fn decode_classifies_exception_responses() {
        let mut response = vec![0; 19];
        response[7] = 0x2b | 0x80;
        response[8] = 0x05;
        assert_eq!(frame::decode_response(&response, Some(2)), Err(ProtocolError::Exception(0x05)));
        assert_eq!(frame::decode_response(&response, None), Err(ProtocolError::Exception(0x05)));
    }

    #[test]
    fn decode_accepts_write_acknowledgements() {
        // a peer echoing the write request acknowledges it
        let echo = frame::encode_write(7, 0x6040, 0, 0x000f, 2).unwrap();
        assert_eq!(frame::decode_response(&echo, None), Ok(None));
        // but a truncated transport header never acknowledges anything
        assert_eq!(frame::decode_response(&echo[.. 5], None), Err(ProtocolError::ShortResponse(5)));
    }

    // ---------------- state machine ----------------

    #[test]
    fn classification_is_total_and_priority_ordered() {
        assert_eq!(DriveState::classify(0x0008), DriveState::Fault);
        assert_eq!(DriveState::classify(0x0608), DriveState::Fault);
        assert_eq!(DriveState::classify(0x0027), DriveState::OperationEnabled);
        assert_eq!(DriveState::classify(0x1627), DriveState::OperationEnabled);
        assert_eq!(DriveState::classify(0x0023), DriveState::SwitchedOn);
        assert_eq!(DriveState::classify(0x0021), DriveState::ReadyToSwitchOn);
        assert_eq!(DriveState::classify(0x0040), DriveState::SwitchOnDisabled);
        assert_eq!(DriveState::classify(0x0240), DriveState::SwitchOnDisabled);
        assert_eq!(DriveState::classify(0x0000), DriveState::NotReadyToSwitchOn);
        // quick-stop-active pattern matches no canonical state
        assert_eq!(DriveState::classify(0x0007), DriveState::Unknown);
    }

    #[test]
    fn transition_table_follows_the_standard() {
        assert_eq!(DriveState::SwitchOnDisabled.advance(), Some(command::SHUTDOWN));
        assert_eq!(DriveState::ReadyToSwitchOn.advance(), Some(command::SWITCH_ON));
        assert_eq!(DriveState::SwitchedOn.advance(), Some(command::ENABLE_OPERATION));
        assert_eq!(DriveState::Fault.advance(), Some(command::FAULT_RESET));
        assert_eq!(DriveState::OperationEnabled.advance(), None);
        assert_eq!(DriveState::NotReadyToSwitchOn.advance(), None);
    }

    #[test]
    fn statusword_flags_are_where_the_drive_puts_them() {
        let word = StatusWord::from(0x1627u16);
        assert!(word.operation_enabled());
        assert!(word.target_reached());
        assert!(word.homing_attained());
        assert!(word.remote());
        assert!(! word.fault());
    }

    // ---------------- bring up ----------------

    #[tokio::test]
    async fn bring_up_issues_the_standard_sequence() {
        let mock = DriveMock::new(&[0x0240, 0x0221, 0x0223, 0x0227]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.bring_up().await.unwrap();
        let mock = axis.client().socket();
        assert_eq!(mock.controlwords, [0x0006, 0x0007, 0x000f]);
        // transaction ids are populated and monotonic
        assert_eq!(&mock.transactions[.. 3], [0, 1, 2]);
    }

    #[tokio::test]
    async fn bring_up_times_out_on_a_stalled_transition() {
        // the drive accepts shutdown but never switches on
        let mock = DriveMock::new(&[0x0240, 0x0221]);
        let mut axis = Axis::with_timing(mock, fast());
        match axis.bring_up().await {
            Err(AxisError::StateTransitionTimeout {expected, observed}) => {
                assert_eq!(expected, DriveState::SwitchedOn);
                assert_eq!(observed, DriveState::ReadyToSwitchOn);
            }
            other => panic!("expected a state transition timeout, got {other:?}"),
        }
        assert_eq!(axis.client().socket().controlwords, [0x0006, 0x0007]);
    }

    #[tokio::test]
    async fn bring_up_resets_a_faulted_drive_first() {
        let mock = DriveMock::new(&[0x0208, 0x0240, 0x0221, 0x0223, 0x0227]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.bring_up().await.unwrap();
        assert_eq!(axis.client().socket().controlwords, [0x0080, 0x0006, 0x0007, 0x000f]);
    }

    #[tokio::test]
    async fn bring_up_waits_out_a_not_ready_controller() {
        let mock = DriveMock::new(&[0x0000, 0x0000, 0x0240, 0x0221, 0x0223, 0x0227]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.bring_up().await.unwrap();
        // no controlword may be issued before the controller reaches switch-on-disabled by itself
        assert_eq!(axis.client().socket().controlwords, [0x0006, 0x0007, 0x000f]);
    }

    // ---------------- motion ----------------

    #[tokio::test]
    async fn home_pulses_the_start_bit_and_waits_for_completion() {
        let mock = DriveMock::new(&[0x0227, 0x0227, 0x1627]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.home(&HomingProfile::default()).await.unwrap();
        let mock = axis.client().socket();
        assert_rising_edge(&mock.controlwords);
        assert_eq!(mock.controlwords, [0x001f, 0x000f]);
        // homing mode requested, parameters written
        assert!(mock.writes.contains(&(0x6060, 0, 6)));
        assert!(mock.writes.contains(&(0x6099, 1, 6000)));
        assert!(mock.writes.contains(&(0x6099, 2, 6000)));
        assert!(mock.writes.contains(&(0x609a, 0, 100_000)));
        assert!(mock.writes.contains(&(0x6092, 1, 5400)));
        assert!(mock.writes.contains(&(0x6092, 2, 1)));
    }

    #[tokio::test]
    async fn home_times_out_when_the_reference_is_never_found() {
        let mock = DriveMock::new(&[0x0227]);
        let mut axis = Axis::with_timing(mock, fast());
        match axis.home(&HomingProfile::default()).await {
            Err(AxisError::HomingTimeout) => (),
            other => panic!("expected a homing timeout, got {other:?}"),
        }
        assert_rising_edge(&axis.client().socket().controlwords);
    }

    #[tokio::test]
    async fn move_absolute_writes_profile_then_target_then_edges() {
        let mock = DriveMock::new(&[0x0227, 0x0227, 0x0627]);
        let mut axis = Axis::with_timing(mock, fast());
        let profile = MotionProfile {velocity: 1000, acceleration: 2000, deceleration: 2000};
        axis.move_to(5400, &profile, Positioning::Absolute).await.unwrap();
        let mock = axis.client().socket();
        assert_rising_edge(&mock.controlwords);
        assert_eq!(mock.controlwords, [0x001f, 0x000f]);
        assert!(mock.writes.contains(&(0x6060, 0, 1)));
        assert!(mock.writes.contains(&(0x6081, 0, 1000)));
        assert!(mock.writes.contains(&(0x6083, 0, 2000)));
        assert!(mock.writes.contains(&(0x6084, 0, 2000)));
        assert!(mock.writes.contains(&(0x607a, 0, 5400)));
    }

    #[tokio::test]
    async fn move_relative_sets_the_relative_bit_in_the_whole_pulse() {
        let mock = DriveMock::new(&[0x0227, 0x0627]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.move_to(-10, &MotionProfile::default(), Positioning::Relative).await.unwrap();
        let mock = axis.client().socket();
        assert_eq!(mock.controlwords, [0x005f, 0x004f]);
        // target truncated to its 4 wire bytes, two's complement
        assert!(mock.writes.contains(&(0x607a, 0, 0xffff_fff6)));
    }

    #[tokio::test]
    async fn motion_fails_fast_when_the_drive_is_not_operational() {
        let mock = DriveMock::new(&[0x0208]);
        let mut axis = Axis::with_timing(mock, fast());
        match axis.move_to(100, &MotionProfile::default(), Positioning::Absolute).await {
            Err(AxisError::NotOperational(DriveState::Fault)) => (),
            other => panic!("expected not-operational, got {other:?}"),
        }
        // nothing was queued on the faulted drive
        assert!(axis.client().socket().writes.is_empty());
    }

    #[tokio::test]
    async fn motion_aborts_when_the_drive_faults_mid_move() {
        let mock = DriveMock::new(&[0x0227, 0x0227, 0x0208]);
        let mut axis = Axis::with_timing(mock, fast());
        match axis.move_to(100, &MotionProfile::default(), Positioning::Absolute).await {
            Err(AxisError::NotOperational(DriveState::Fault)) => (),
            other => panic!("expected not-operational, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn abort_handle_stops_the_axis() {
        let mock = DriveMock::new(&[0x0227, 0x0227]);
        let mut axis = Axis::with_timing(mock, fast());
        axis.abort_handle().abort();
        match axis.home(&HomingProfile::default()).await {
            Err(AxisError::Aborted) => (),
            other => panic!("expected aborted, got {other:?}"),
        }
        // the stop (halt) went out before returning
        assert_eq!(axis.client().socket().controlwords.last(), Some(&0x010f));
    }

    #[tokio::test]
    async fn mode_switch_is_verified_not_assumed() {
        let mut mock = DriveMock::new(&[0x0227]);
        mock.mode_sticky = true;
        let mut axis = Axis::with_timing(mock, fast());
        match axis.home(&HomingProfile::default()).await {
            Err(AxisError::ModeSwitchTimeout(_)) => (),
            other => panic!("expected a mode switch timeout, got {other:?}"),
        }
        // no parameter or start was written on the wrong mode
        assert!(axis.client().socket().controlwords.is_empty());
    }

    // ---------------- client error mapping ----------------

    #[tokio::test]
    async fn short_replies_surface_as_short_response_never_as_values() {
        let mut mock = DriveMock::new(&[0x0227]);
        mock.truncate = Some(5);
        let mut axis = Axis::with_timing(mock, fast());
        match axis.status().await {
            Err(AxisError::ShortResponse(5)) => (),
            other => panic!("expected short response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn device_type_probe_reads_the_identity_object() {
        let mock = DriveMock::new(&[]);
        let mut axis = Axis::with_timing(mock, fast());
        assert_eq!(axis.device_type().await.unwrap(), 0x0002_0192);
    }

    // ---------------- axis set ----------------

    #[tokio::test]
    async fn move_all_returns_only_once_every_axis_reached_target() {
        // axis a reaches its target one poll before axis b
        let a = DriveMock::new(&[0x0227, 0x0627]);
        let b = DriveMock::new(&[0x0227, 0x0227, 0x0627]);
        let mut set = AxisSet::new(vec![
            Axis::with_timing(a, fast()),
            Axis::with_timing(b, fast()),
        ]);
        let motion = AxisMove {
            target: 5400,
            profile: MotionProfile::default(),
            positioning: Positioning::Absolute,
        };
        set.move_all(&[motion, motion]).await.unwrap();
        // the slower axis was polled to completion
        assert!(set.axes()[1].client().socket().statuses.is_empty());
    }

    #[tokio::test]
    async fn move_all_stops_healthy_axes_when_one_faults() {
        // axis a keeps moving fine, axis b faults on the first poll
        let a = DriveMock::new(&[0x0227, 0x0227]);
        let b = DriveMock::new(&[0x0227, 0x0208]);
        let mut set = AxisSet::new(vec![
            Axis::with_timing(a, fast()),
            Axis::with_timing(b, fast()),
        ]);
        let motion = AxisMove {
            target: 100,
            profile: MotionProfile::default(),
            positioning: Positioning::Absolute,
        };
        match set.move_all(&[motion, motion]).await {
            Err(AxisError::NotOperational(DriveState::Fault)) => (),
            other => panic!("expected not-operational, got {other:?}"),
        }
        // the healthy axis was stopped even though it was still moving successfully
        let healthy = set.axes()[0].client().socket();
        assert_eq!(healthy.controlwords.last(), Some(&0x010f));
        assert_rising_edge(&healthy.controlwords[.. healthy.controlwords.len() - 1]);
    }

    #[tokio::test]
    async fn bring_up_all_drives_every_axis_to_operation_enabled() {
        let a = DriveMock::new(&[0x0240, 0x0221, 0x0223, 0x0227]);
        let b = DriveMock::new(&[0x0208, 0x0240, 0x0221, 0x0223, 0x0227]);
        let mut set = AxisSet::new(vec![
            Axis::with_timing(a, fast()),
            Axis::with_timing(b, fast()),
        ]);
        set.bring_up_all().await.unwrap();
        assert_eq!(set.axes()[0].client().socket().controlwords, [0x0006, 0x0007, 0x000f]);
        assert_eq!(set.axes()[1].client().socket().controlwords, [0x0080, 0x0006, 0x0007, 0x000f]);
    }
}
