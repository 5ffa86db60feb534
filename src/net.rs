use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Best-effort discovery of the address this host is reachable at on the
/// local network, used to build the advertised URL. Connecting a UDP socket
/// sends no packets; it only asks the OS which interface it would route
/// through. Falls back to loopback when the host is offline.
pub fn local_ip() -> IpAddr {
    fn probe() -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(("8.8.8.8", 80))?;
        Ok(socket.local_addr()?.ip())
    }

    probe().unwrap_or_else(|_| IpAddr::V4(Ipv4Addr::LOCALHOST))
}
