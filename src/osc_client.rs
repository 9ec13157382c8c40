use std::net::{SocketAddrV4, UdpSocket};

use rosc::encoder;
use rosc::OscPacket;

pub struct OscClient {
    socket: UdpSocket,
    target_addr: SocketAddrV4,
}

impl OscClient {
    pub fn new(socket: UdpSocket, target_addr: SocketAddrV4) -> OscClient {
        OscClient {
            socket,
            target_addr,
        }
    }

    /// Fire-and-forget send. A dead synth process must never take the MIDI
    /// path down with it, so failures are logged and swallowed.
    pub fn send(&self, packet: OscPacket) {
        let msg_buf = match encoder::encode(&packet) {
            Ok(buf) => buf,
            Err(err) => {
                log::warn!(target: "osc", "dropping unencodable packet: {}", err);
                return;
            }
        };

        if let Err(err) = self.socket.send_to(&msg_buf, self.target_addr) {
            log::warn!(target: "osc", "send to {} failed: {}", self.target_addr, err);
        }
    }
}
