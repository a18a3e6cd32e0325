/*!
    coordination of several axes from one call.

    "Synchronized" here is an approximation the protocol allows, not a guarantee it cannot
    give: parameters and start edges are issued to every axis before any of them is polled,
    so the start skew is bounded by the sum of the per-axis round-trip times. A caller
    needing tighter synchronization must run each axis on its own task and join, which is
    the only place true concurrency is admissible (one connection, one exclusive owner).
*/

use futures_concurrency::future::Join;
use crate::{
    axis::Axis,
    error::{AxisError, AxisResult},
    motion::{MotionProfile, Poll, Positioning},
    registers::OperationMode,
    socket::GatewaySocket,
    };


/// one per-axis command of [AxisSet::move_all]
#[derive(Copy, Clone, Debug)]
pub struct AxisMove {
    pub target: i32,
    pub profile: MotionProfile,
    pub positioning: Positioning,
}

/// a group of axes commanded together
pub struct AxisSet<S> {
    axes: Vec<Axis<S>>,
}

impl<S: GatewaySocket> AxisSet<S> {
    pub fn new(axes: Vec<Axis<S>>) -> Self  {Self {axes}}
    pub fn push(&mut self, axis: Axis<S>)  {self.axes.push(axis)}
    pub fn len(&self) -> usize  {self.axes.len()}
    pub fn is_empty(&self) -> bool  {self.axes.is_empty()}
    pub fn axes(&mut self) -> &mut [Axis<S>]  {&mut self.axes}
    pub fn into_axes(self) -> Vec<Axis<S>>  {self.axes}

    /// bring every axis up to operation enabled, concurrently since each future owns its own axis
    pub async fn bring_up_all(&mut self) -> AxisResult<()> {
        self.axes.iter_mut()
            .map(|axis| axis.bring_up())
            .collect::<Vec<_>>()
            .join().await
            .into_iter()
            .collect()
    }

    /**
        move every axis to its target and wait for all of them

        Parameters are written and start bits edge-triggered on every axis before any axis
        is polled. Completion is the AND of all target-reached flags; abort is the OR of the
        per-axis abort conditions, and on abort every axis receives a best-effort
        [Axis::stop] before the error is returned, including the ones still moving fine.
    */
    pub async fn move_all(&mut self, moves: &[AxisMove]) -> AxisResult<()> {
        assert_eq!(moves.len(), self.axes.len(), "one move per axis");

        // setup pass: mode and parameters on every axis
        for (axis, motion) in self.axes.iter_mut().zip(moves) {
            axis.require_operational().await?;
            axis.set_mode(OperationMode::ProfilePosition).await?;
            axis.setup_move(motion.target, &motion.profile).await?;
        }
        // start pass: edges only, keeping the skew to the round trips
        for (axis, motion) in self.axes.iter_mut().zip(moves) {
            axis.start_move(motion.positioning).await?;
        }
        log::debug!("started {} axes", self.axes.len());

        let ceiling = self.axes.iter()
            .map(|axis| axis.timing().motion_polls)
            .min().unwrap_or(0);
        let poll = self.axes.first()
            .map(|axis| axis.timing().poll)
            .unwrap_or_default();

        let mut done = vec![false; self.axes.len()];
        let mut abort = None;
        'poll: for _ in 0 .. ceiling {
            tokio::time::sleep(poll).await;
            for (index, axis) in self.axes.iter_mut().enumerate() {
                if done[index]  {continue}
                match axis.poll_move().await {
                    Ok(Poll::Done) => done[index] = true,
                    Ok(Poll::Busy) => (),
                    Ok(Poll::Left(state)) => {
                        log::warn!("axis {index} left operation enabled ('{state}'), stopping all");
                        abort = Some(AxisError::NotOperational(state));
                        break 'poll;
                    }
                    Err(err) => {
                        abort = Some(err);
                        break 'poll;
                    }
                }
            }
            if done.iter().all(|&reached| reached) {
                return Ok(());
            }
        }
        if let Some(err) = abort {
            self.stop_all().await;
            return Err(err);
        }
        Err(AxisError::MoveTimeout)
    }

    /// best-effort stop of every axis, transport failures are logged per axis
    pub async fn stop_all(&mut self) {
        for axis in &mut self.axes {
            axis.stop().await;
        }
    }
}
