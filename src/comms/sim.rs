//! In-process simulated comms
//!
//! The test substrate for the coordinator: telemetry is scripted into a
//! queue, sent commands are logged per drone, and send failures can be
//! injected to exercise the fire-and-forget discipline.

use super::{DroneCommand, SwarmComms, TelemetryFrame};
use crate::types::{CoordinationError, DroneId, Result};
use log::trace;
use std::collections::{HashMap, VecDeque};

/// Simulated radio link
#[derive(Debug, Default)]
pub struct SimulatedComms {
    connected: bool,
    registered: Vec<DroneId>,
    telemetry_queue: VecDeque<TelemetryFrame>,
    sent: HashMap<u64, Vec<DroneCommand>>,
    /// Inject send failures when set
    pub fail_sends: bool,
}

impl SimulatedComms {
    /// Fresh, disconnected link
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a telemetry frame for the coordinator to drain
    pub fn push_telemetry(&mut self, frame: TelemetryFrame) {
        self.telemetry_queue.push_back(frame);
    }

    /// Commands sent to one drone, in order
    pub fn sent_commands(&self, drone: DroneId) -> &[DroneCommand] {
        self.sent
            .get(&drone.as_u64())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent command sent to one drone
    pub fn last_command(&self, drone: DroneId) -> Option<&DroneCommand> {
        self.sent.get(&drone.as_u64()).and_then(|log| log.last())
    }

    /// Total commands sent across all drones
    pub fn total_sent(&self) -> usize {
        self.sent.values().map(Vec::len).sum()
    }

    /// Drones named at connect time
    pub fn registered(&self) -> &[DroneId] {
        &self.registered
    }
}

impl SwarmComms for SimulatedComms {
    fn connect(&mut self, drones: &[DroneId]) -> Result<()> {
        self.registered = drones.to_vec();
        self.connected = true;
        trace!("simulated link up for {} drone(s)", drones.len());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        trace!("simulated link down");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send_command(&mut self, drone: DroneId, command: &DroneCommand) -> Result<()> {
        if !self.connected {
            return Err(CoordinationError::NotConnected);
        }
        if self.fail_sends {
            return Err(CoordinationError::CommFailure);
        }
        self.sent
            .entry(drone.as_u64())
            .or_default()
            .push(command.clone());
        Ok(())
    }

    fn recv_telemetry(&mut self) -> Option<TelemetryFrame> {
        self.telemetry_queue.pop_front()
    }
}
